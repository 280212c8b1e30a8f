//! Request context carrying per-request attributes.
//!
//! The catalog reads a single attribute from the context: the caller's
//! language preference, stored under the configured language key. To
//! accommodate heterogeneous callers the same key is accepted in two shapes,
//! a typed [`ContextKey`] and its plain string form; the typed shape wins
//! when both are present, and the string shape is the best-effort
//! compatibility path.

use std::collections::HashMap;

/// Typed context key, for callers that register attributes under a dedicated
/// key type rather than a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn new(name: impl Into<String>) -> Self {
        ContextKey(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextKey {
    fn from(name: &str) -> Self {
        ContextKey::new(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntryKey {
    Typed(String),
    Plain(String),
}

/// Per-request attribute bag consulted by the catalog.
///
/// # Example
/// ```
/// use msgcat::{ContextKey, RequestContext};
///
/// let ctx = RequestContext::new().with_value("language", "es-AR");
/// assert_eq!(ctx.get("language"), Some("es-AR"));
///
/// let typed = RequestContext::new().with_typed_value(ContextKey::new("language"), "es");
/// assert_eq!(typed.get_typed("language"), Some("es"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    values: HashMap<EntryKey, String>,
}

impl RequestContext {
    /// An empty context. Resolution against an empty context uses the
    /// catalog's default language.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute under the plain string key shape.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(key, value);
        self
    }

    /// Set an attribute under the typed key shape.
    pub fn with_typed_value(mut self, key: ContextKey, value: impl Into<String>) -> Self {
        self.set_typed_value(key, value);
        self
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(EntryKey::Plain(key.into()), value.into());
    }

    pub fn set_typed_value(&mut self, key: ContextKey, value: impl Into<String>) {
        self.values.insert(EntryKey::Typed(key.0), value.into());
    }

    /// Attribute stored under the plain string key shape.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&EntryKey::Plain(key.to_string()))
            .map(String::as_str)
    }

    /// Attribute stored under the typed key shape.
    pub fn get_typed(&self, key: &str) -> Option<&str> {
        self.values
            .get(&EntryKey::Typed(key.to_string()))
            .map(String::as_str)
    }

    /// Attribute lookup the way the catalog performs it: typed key first,
    /// then the plain string form.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.get_typed(key).or_else(|| self.get(key))
    }
}
