//! Language tag normalization and fallback candidate chains.
//!
//! Tags are compared in a single canonical shape: trimmed, ASCII-lowercased,
//! with `_` separators replaced by `-` (so `es_AR`, ` ES-ar ` and `es-ar`
//! are the same tag). The base tag is the part before the first `-`.

/// Normalize a language tag: trim, lowercase, `_` -> `-`.
///
/// Normalization is idempotent; normalizing an already-normalized tag is a
/// no-op.
pub fn normalize_lang_tag(lang: &str) -> String {
    lang.trim().to_ascii_lowercase().replace('_', "-")
}

/// Base tag of a normalized language tag (`"es-ar"` -> `"es"`).
///
/// A tag without `-`, or with a leading `-`, is its own base.
pub fn base_lang_tag(lang: &str) -> &str {
    match lang.find('-') {
        Some(idx) if idx > 0 => &lang[..idx],
        _ => lang,
    }
}

/// Append `lang` to the chain unless empty or already present.
fn push_candidate(chain: &mut Vec<String>, lang: String) {
    if lang.is_empty() || chain.iter().any(|c| *c == lang) {
        return;
    }
    chain.push(lang);
}

/// Build the ordered lookup chain for a requested tag:
/// `[requested, base(requested), fallbacks.., default, "en"]`,
/// all normalized, duplicates suppressed by first occurrence.
pub fn candidate_chain(requested: &str, fallbacks: &[String], default_language: &str) -> Vec<String> {
    let requested = normalize_lang_tag(requested);
    let mut chain = Vec::with_capacity(4 + fallbacks.len());
    push_candidate(&mut chain, requested.clone());
    push_candidate(&mut chain, base_lang_tag(&requested).to_string());
    for fallback in fallbacks {
        push_candidate(&mut chain, normalize_lang_tag(fallback));
    }
    push_candidate(&mut chain, normalize_lang_tag(default_language));
    push_candidate(&mut chain, "en".to_string());
    chain
}
