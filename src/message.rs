//! Catalog data model: raw entries, per-language message sets, resolved
//! messages, and the stable values exposed to downstream consumers.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

/// Reserved key prefix for entries injected at runtime through
/// `load_messages`; every runtime entry's key must start with it.
pub const RUNTIME_KEY_PREFIX: &str = "sys.";

/// Stable code reported when the resolved language has no entry for the
/// requested key. Compare by equality.
pub const CODE_MISSING_MESSAGE: &str = "missing_message";

/// Stable code reported when no language in the candidate chain exists in
/// the catalog. Compare by equality.
pub const CODE_MISSING_LANGUAGE: &str = "missing_language";

/// Text template used when the requested language cannot be resolved;
/// `{lang}` is replaced with the normalized requested tag.
pub const LANGUAGE_NOT_FOUND_TEMPLATE: &str =
    "Unexpected error in message catalog, language [{lang}] not found.";

/// Short/long stock texts for an unresolvable language.
pub(crate) fn language_not_found_texts(lang: &str) -> (String, String) {
    let short = LANGUAGE_NOT_FOUND_TEMPLATE.replace("{lang}", lang);
    let long = format!("{short} Please, contact support.");
    (short, long)
}

fn key_regex() -> &'static Regex {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    KEY_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("key regex must compile"))
}

/// Whether `key` is a well-formed message key (`[A-Za-z0-9_.-]+`).
pub(crate) fn is_valid_key(key: &str) -> bool {
    key_regex().is_match(key)
}

/// Accepts `code`/`group` scalars written as int or string and stores the
/// string form.
fn opt_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Int(i64),
        Str(String),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Int(value) => value.to_string(),
        Scalar::Str(value) => value,
    }))
}

/// One catalog entry.
///
/// `code` is optional and user-defined (`404`, `"ERR_NOT_FOUND"`, ...);
/// uniqueness is not enforced and empty codes fall back to the message key
/// as the API identifier. When `short_forms`/`long_forms` are present the
/// entry is plural-aware: the form is picked by the CLDR selector from the
/// parameter named by `plural_param` (default `"count"`). If that parameter
/// is absent or not an integer, the plain `short`/`long` templates are used
/// and the forms are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMessage {
    /// Short template. In YAML: `short`.
    #[serde(default, rename = "short")]
    pub short_tpl: String,

    /// Long template. In YAML: `long`.
    #[serde(default, rename = "long")]
    pub long_tpl: String,

    /// Optional user-defined code; int or string in YAML, stored as string.
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub code: Option<String>,

    /// Per-CLDR-form short templates (`one`, `other`, ...).
    #[serde(default)]
    pub short_forms: Option<HashMap<String, String>>,

    /// Per-CLDR-form long templates.
    #[serde(default)]
    pub long_forms: Option<HashMap<String, String>>,

    /// Parameter driving form selection; defaults to `"count"`.
    #[serde(default)]
    pub plural_param: Option<String>,

    /// Message key. YAML entries take the map key; runtime entries carry
    /// their own.
    #[serde(skip)]
    pub key: String,
}

impl RawMessage {
    /// Whether the entry defines any plural form map.
    pub fn has_forms(&self) -> bool {
        self.short_forms.is_some() || self.long_forms.is_some()
    }

    /// Name of the parameter driving plural form selection.
    pub fn plural_param_name(&self) -> &str {
        self.plural_param.as_deref().unwrap_or("count")
    }
}

/// All messages for one language: the required default entry, the keyed
/// set, and the opaque `group` tag (stored, never interpreted).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageMessages {
    #[serde(default)]
    pub default: RawMessage,

    /// Entries keyed by message key. A missing `set` is an empty set.
    #[serde(default)]
    pub set: HashMap<String, RawMessage>,

    /// Opaque tag; int or string in YAML, stored as string.
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub group: Option<String>,
}

/// A resolved, rendered message. Carries copies of everything it needs; no
/// borrow ties it to catalog state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub short_text: String,
    pub long_text: String,
    /// Entry code, a sentinel code, or empty. Use `key` as the identifier
    /// when empty.
    pub code: String,
    /// The queried key, echoed back even when the entry was missing.
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Key Format Tests ====================

    #[test]
    fn test_valid_keys() {
        for key in ["greeting.hello", "a", "A-b_c.9", "sys.maintenance"] {
            assert!(is_valid_key(key), "{key}");
        }
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", "has space", "semi;colon", "ключ", "a/b"] {
            assert!(!is_valid_key(key), "{key:?}");
        }
    }

    // ==================== Schema Tests ====================

    #[test]
    fn test_entry_from_yaml_with_int_code() {
        let raw: RawMessage = serde_yaml::from_str("short: Hello\nlong: Hi\ncode: 404\n").unwrap();
        assert_eq!(raw.short_tpl, "Hello");
        assert_eq!(raw.code.as_deref(), Some("404"));
    }

    #[test]
    fn test_entry_from_yaml_with_string_code() {
        let raw: RawMessage = serde_yaml::from_str("short: Hello\ncode: ERR_NOT_FOUND\n").unwrap();
        assert_eq!(raw.code.as_deref(), Some("ERR_NOT_FOUND"));
        assert_eq!(raw.long_tpl, "");
    }

    #[test]
    fn test_entry_forms_and_plural_param() {
        let raw: RawMessage = serde_yaml::from_str(
            "short_forms:\n  one: \"{{count}} cat\"\n  other: \"{{count}} cats\"\nplural_param: n\n",
        )
        .unwrap();
        assert!(raw.has_forms());
        assert_eq!(raw.plural_param_name(), "n");
        assert_eq!(
            raw.short_forms.unwrap().get("one").map(String::as_str),
            Some("{{count}} cat")
        );
    }

    #[test]
    fn test_plural_param_defaults_to_count() {
        let raw = RawMessage::default();
        assert_eq!(raw.plural_param_name(), "count");
        assert!(!raw.has_forms());
    }

    #[test]
    fn test_language_messages_missing_set_is_empty() {
        let messages: LanguageMessages =
            serde_yaml::from_str("default:\n  short: Oops\n").unwrap();
        assert!(messages.set.is_empty());
        assert_eq!(messages.default.short_tpl, "Oops");
        assert_eq!(messages.group, None);
    }

    #[test]
    fn test_language_messages_group_int_or_string() {
        let with_int: LanguageMessages =
            serde_yaml::from_str("default:\n  short: x\ngroup: 7\n").unwrap();
        assert_eq!(with_int.group.as_deref(), Some("7"));

        let with_str: LanguageMessages =
            serde_yaml::from_str("default:\n  short: x\ngroup: api\n").unwrap();
        assert_eq!(with_str.group.as_deref(), Some("api"));
    }

    // ==================== Stock Text Tests ====================

    #[test]
    fn test_language_not_found_texts_embed_tag() {
        let (short, long) = language_not_found_texts("xx-zz");
        assert!(short.contains("[xx-zz]"));
        assert!(long.contains("[xx-zz]"));
        assert!(long.contains("contact support"));
    }
}
