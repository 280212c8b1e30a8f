//! Named template parameters.
//!
//! Templates are rendered against a [`Params`] bag mapping parameter names to
//! [`ParamValue`]s. The value set is a closed tagged variant (string, signed
//! and unsigned integers, float, bool, timestamp); anything else enters the
//! bag through its string form.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};

/// One parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl ParamValue {
    /// String form used by simple `{{name}}` substitution: integers in
    /// decimal, floats in their shortest round-trip form, booleans as
    /// `true`/`false`, timestamps as RFC3339.
    pub fn display_string(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Uint(u) => u.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Time(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Whether the value is numerically equal to 1. `None` for non-numeric
    /// values.
    pub fn equals_one(&self) -> Option<bool> {
        match self {
            ParamValue::Int(i) => Some(*i == 1),
            ParamValue::Uint(u) => Some(*u == 1),
            ParamValue::Float(f) => Some(*f == 1.0),
            _ => None,
        }
    }

    /// Integer value for plural form selection. Floats qualify only when
    /// integer-valued; non-numeric values yield `None`.
    pub fn plural_count(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Uint(u) => i64::try_from(*u).ok(),
            ParamValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Timestamp value, when the parameter carries one.
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            ParamValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i8> for ParamValue {
    fn from(value: i8) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i16> for ParamValue {
    fn from(value: i16) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u8> for ParamValue {
    fn from(value: u8) -> Self {
        ParamValue::Uint(value.into())
    }
}

impl From<u16> for ParamValue {
    fn from(value: u16) -> Self {
        ParamValue::Uint(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Uint(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Uint(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        ParamValue::Time(value)
    }
}

impl From<&DateTime<Utc>> for ParamValue {
    fn from(value: &DateTime<Utc>) -> Self {
        ParamValue::Time(*value)
    }
}

/// A named parameter bag.
///
/// # Example
/// ```
/// use msgcat::Params;
///
/// let params = Params::new().with("name", "juan").with("count", 3);
/// assert!(params.get("name").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: HashMap<String, ParamValue>,
}

impl Params {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a parameter, replacing any previous value under the name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
