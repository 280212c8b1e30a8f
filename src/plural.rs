//! CLDR plural form selection.
//!
//! Given a language tag and an integer count, [`select`] returns one of the
//! six CLDR forms. Selection dispatches on the base tag; languages without a
//! dedicated rule use the English one/other split, and fully unknown tags
//! yield [`PluralForm::Other`]. Negative counts are classified by their
//! absolute value.

use crate::language::base_lang_tag;

/// The six CLDR plural categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralForm {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralForm {
    /// Canonical lowercase name, as used in `short_forms`/`long_forms` maps
    /// and in CLDR-tagged plural placeholder branches.
    pub fn name(self) -> &'static str {
        match self {
            PluralForm::Zero => "zero",
            PluralForm::One => "one",
            PluralForm::Two => "two",
            PluralForm::Few => "few",
            PluralForm::Many => "many",
            PluralForm::Other => "other",
        }
    }

    /// Parse a form name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<PluralForm> {
        match name {
            "zero" => Some(PluralForm::Zero),
            "one" => Some(PluralForm::One),
            "two" => Some(PluralForm::Two),
            "few" => Some(PluralForm::Few),
            "many" => Some(PluralForm::Many),
            "other" => Some(PluralForm::Other),
            _ => None,
        }
    }
}

/// Select the CLDR plural form for `lang` and `count`.
pub fn select(lang: &str, count: i64) -> PluralForm {
    let n = count.unsigned_abs();
    match base_lang_tag(lang) {
        "ar" => arabic(n),
        "he" | "iw" => hebrew(n),
        "ru" | "uk" | "be" | "sr" | "hr" | "bs" | "sh" => russian(n),
        "pl" => polish(n),
        "cy" | "br" | "ga" | "gd" | "gv" | "kw" | "mt" | "sm" | "ak" => welsh(n),
        _ => one_other(n),
    }
}

fn one_other(n: u64) -> PluralForm {
    if n == 1 {
        PluralForm::One
    } else {
        PluralForm::Other
    }
}

fn arabic(n: u64) -> PluralForm {
    match n {
        0 => PluralForm::Zero,
        1 => PluralForm::One,
        2 => PluralForm::Two,
        3..=10 => PluralForm::Few,
        11..=99 => PluralForm::Many,
        _ => PluralForm::Other,
    }
}

// Hebrew follows the Arabic shape without the zero form.
fn hebrew(n: u64) -> PluralForm {
    match n {
        1 => PluralForm::One,
        2 => PluralForm::Two,
        3..=10 => PluralForm::Few,
        11..=99 => PluralForm::Many,
        _ => PluralForm::Other,
    }
}

fn russian(n: u64) -> PluralForm {
    let u = n % 10;
    let h = n % 100;
    if u == 1 && h != 11 {
        PluralForm::One
    } else if (2..=4).contains(&u) && !(12..=14).contains(&h) {
        PluralForm::Few
    } else if u == 0 || (5..=9).contains(&u) || (11..=14).contains(&h) {
        PluralForm::Many
    } else {
        PluralForm::Other
    }
}

fn polish(n: u64) -> PluralForm {
    if n == 1 {
        return PluralForm::One;
    }
    let u = n % 10;
    let h = n % 100;
    if (2..=4).contains(&u) && !(12..=14).contains(&h) {
        PluralForm::Few
    } else if u == 0 || (5..=9).contains(&u) || (12..=14).contains(&h) {
        PluralForm::Many
    } else {
        PluralForm::Other
    }
}

fn welsh(n: u64) -> PluralForm {
    match n {
        0 => PluralForm::Zero,
        1 => PluralForm::One,
        2 => PluralForm::Two,
        3 => PluralForm::Few,
        6 => PluralForm::Many,
        _ => PluralForm::Other,
    }
}
