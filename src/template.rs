//! Template rendering.
//!
//! Templates carry `{{...}}` placeholders in four classes: plural
//! (`{{plural:name|...}}`), number (`{{num:name}}`), date (`{{date:name}}`)
//! and simple (`{{name}}`). The template is tokenized in a single scan
//! against the original parameter map; substituted text, including plural
//! branch text, is never rescanned, so placeholders nested inside a branch
//! come out literal.
//!
//! Missing parameters are reported through the issue callback as
//! `<class>_missing_param_<name>` and, in strict mode, replaced with the
//! literal `<missing:name>`; outside strict mode the token stays in place.
//! Ill-typed parameters are reported as `<class>_invalid_param_<name>` and
//! always leave the token in place.

use std::sync::OnceLock;

use regex::Regex;

use crate::language::base_lang_tag;
use crate::params::{ParamValue, Params};
use crate::plural::{self, PluralForm};

fn param_name_regex() -> &'static Regex {
    static PARAM_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    PARAM_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("param name regex must compile")
    })
}

fn is_param_name(name: &str) -> bool {
    param_name_regex().is_match(name)
}

/// Render `template` for `lang` against `params`.
///
/// Template issues are reported through `issues` with the bare issue tag;
/// the caller scopes them to a language and message key.
pub(crate) fn render(
    template: &str,
    lang: &str,
    params: &Params,
    strict: bool,
    issues: &mut dyn FnMut(&str),
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while let Some(open_rel) = template[i..].find("{{") {
        let open = i + open_rel;
        out.push_str(&template[i..open]);

        let Some(close) = find_closing(template.as_bytes(), open + 2) else {
            // Unclosed placeholder, emit the rest verbatim.
            out.push_str(&template[open..]);
            return out;
        };

        let token = &template[open..close + 2];
        let inner = &template[open + 2..close];
        out.push_str(&render_token(inner, token, lang, params, strict, issues));
        i = close + 2;
    }

    out.push_str(&template[i..]);
    out
}

/// Position of the `}}` closing a placeholder opened just before `from`,
/// skipping balanced nested `{{...}}` pairs.
fn find_closing(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = from;
    while j + 1 < bytes.len() {
        if bytes[j] == b'{' && bytes[j + 1] == b'{' {
            depth += 1;
            j += 2;
        } else if bytes[j] == b'}' && bytes[j + 1] == b'}' {
            if depth == 0 {
                return Some(j);
            }
            depth -= 1;
            j += 2;
        } else {
            j += 1;
        }
    }
    None
}

/// Split on `sep` at nesting depth zero, so branch separators inside nested
/// `{{...}}` pairs stay untouched.
fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut j = 0;
    while j < bytes.len() {
        if bytes[j] == b'{' && j + 1 < bytes.len() && bytes[j + 1] == b'{' {
            depth += 1;
            j += 2;
        } else if bytes[j] == b'}' && j + 1 < bytes.len() && bytes[j + 1] == b'}' {
            depth = depth.saturating_sub(1);
            j += 2;
        } else if bytes[j] == sep && depth == 0 {
            parts.push(&text[start..j]);
            start = j + 1;
            j += 1;
        } else {
            j += 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

fn render_token(
    inner: &str,
    token: &str,
    lang: &str,
    params: &Params,
    strict: bool,
    issues: &mut dyn FnMut(&str),
) -> String {
    if let Some(rest) = inner.strip_prefix("plural:") {
        return render_plural(rest, token, lang, params, strict, issues);
    }
    if let Some(name) = inner.strip_prefix("num:") {
        return render_scalar("number", name, token, params, strict, issues, |value| {
            format_number(lang, value)
        });
    }
    if let Some(name) = inner.strip_prefix("date:") {
        return render_scalar("date", name, token, params, strict, issues, |value| {
            format_date(lang, value)
        });
    }
    if is_param_name(inner) {
        return render_scalar("simple", inner, token, params, strict, issues, |value| {
            Some(value.display_string())
        });
    }
    // Not a recognized placeholder, leave it verbatim.
    token.to_string()
}

/// Shared lookup/missing/ill-typed handling for the single-parameter
/// classes.
fn render_scalar(
    class: &str,
    name: &str,
    token: &str,
    params: &Params,
    strict: bool,
    issues: &mut dyn FnMut(&str),
    format: impl Fn(&ParamValue) -> Option<String>,
) -> String {
    if !is_param_name(name) {
        return token.to_string();
    }
    let Some(value) = params.get(name) else {
        return missing_param(class, name, token, strict, issues);
    };
    match format(value) {
        Some(rendered) => rendered,
        None => {
            issues(&format!("{class}_invalid_param_{name}"));
            token.to_string()
        }
    }
}

fn missing_param(
    class: &str,
    name: &str,
    token: &str,
    strict: bool,
    issues: &mut dyn FnMut(&str),
) -> String {
    issues(&format!("{class}_missing_param_{name}"));
    if strict {
        format!("<missing:{name}>")
    } else {
        token.to_string()
    }
}

fn render_plural(
    rest: &str,
    token: &str,
    lang: &str,
    params: &Params,
    strict: bool,
    issues: &mut dyn FnMut(&str),
) -> String {
    let segments = split_top_level(rest, b'|');
    if segments.len() < 3 {
        // Need a parameter name and at least two branches.
        return token.to_string();
    }
    let name = segments[0];
    if !is_param_name(name) {
        return token.to_string();
    }
    let branches = &segments[1..];

    let Some(value) = params.get(name) else {
        return missing_param("plural", name, token, strict, issues);
    };

    if branches.len() == 2 {
        return match value.equals_one() {
            Some(true) => branches[0].to_string(),
            Some(false) => branches[1].to_string(),
            None => {
                issues(&format!("plural_invalid_param_{name}"));
                token.to_string()
            }
        };
    }

    // CLDR mode: branches are `<form>:<text>` segments.
    let Some(count) = value.plural_count() else {
        issues(&format!("plural_invalid_param_{name}"));
        return token.to_string();
    };
    let form = plural::select(lang, count);
    select_cldr_branch(branches, form)
}

/// Pick the branch for `form`: exact match, then `other`, then the last
/// branch's text.
fn select_cldr_branch(branches: &[&str], form: PluralForm) -> String {
    let tagged = |branch: &str| -> Option<(PluralForm, String)> {
        let (tag, text) = branch.split_once(':')?;
        Some((PluralForm::from_name(tag)?, text.to_string()))
    };

    let mut other: Option<String> = None;
    for branch in branches {
        if let Some((tag, text)) = tagged(branch) {
            if tag == form {
                return text;
            }
            if tag == PluralForm::Other && other.is_none() {
                other = Some(text);
            }
        }
    }
    if let Some(text) = other {
        return text;
    }
    let last = branches[branches.len() - 1];
    match tagged(last) {
        Some((_, text)) => text,
        None => last.to_string(),
    }
}

/// Locale separators: `(grouping, decimal)`.
fn separators_for(lang: &str) -> (&'static str, &'static str) {
    match base_lang_tag(lang) {
        "es" | "pt" | "fr" | "de" | "it" => (".", ","),
        _ => (",", "."),
    }
}

/// Insert the grouping separator every three digits, right to left.
/// `digits` must be sign-free.
fn group_digits(digits: &str, separator: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = match digits.len() % 3 {
        0 => 3,
        n => n,
    };
    grouped.push_str(&digits[..lead]);
    let mut i = lead;
    while i < digits.len() {
        grouped.push_str(separator);
        grouped.push_str(&digits[i..i + 3]);
        i += 3;
    }
    grouped
}

fn format_signed_integer(negative: bool, digits: &str, group_sep: &str) -> String {
    let grouped = group_digits(digits, group_sep);
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Locale-aware numeric formatting. `None` for non-numeric values.
fn format_number(lang: &str, value: &ParamValue) -> Option<String> {
    let (group_sep, decimal_sep) = separators_for(lang);
    match value {
        ParamValue::Int(i) => Some(format_signed_integer(
            *i < 0,
            &i.unsigned_abs().to_string(),
            group_sep,
        )),
        ParamValue::Uint(u) => Some(group_digits(&u.to_string(), group_sep)),
        ParamValue::Float(f) => {
            // Shortest round-trip form, then locale separators.
            let plain = f.to_string();
            let (sign, unsigned) = match plain.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, plain.as_str()),
            };
            let (int_part, frac_part) = match unsigned.split_once('.') {
                Some((int_part, frac_part)) => (int_part, Some(frac_part)),
                None => (unsigned, None),
            };
            let mut formatted = format_signed_integer(sign, int_part, group_sep);
            if let Some(frac) = frac_part {
                formatted.push_str(decimal_sep);
                formatted.push_str(frac);
            }
            Some(formatted)
        }
        _ => None,
    }
}

/// Locale-aware date formatting. `None` for non-time values.
fn format_date(lang: &str, value: &ParamValue) -> Option<String> {
    let when = value.as_time()?;
    let pattern = match base_lang_tag(lang) {
        "es" | "pt" | "fr" | "de" | "it" => "%d/%m/%Y",
        _ => "%m/%d/%Y",
    };
    Some(when.format(pattern).to_string())
}
