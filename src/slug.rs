//! Normalized keys for taxa and taxonomy databases.
//!
//! A slug is the lower-cased form of a name with punctuation stripped and
//! runs of blanks or hyphens collapsed into a single `-`. Names are NFKD
//! decomposed first so accented letters keep their base letter; whatever is
//! still outside ASCII is dropped.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

fn strip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid slug strip pattern"))
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-\s]+").expect("valid slug separator pattern"))
}

pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let stripped = strip_pattern().replace_all(&ascii, "");
    let lowered = stripped.trim().to_lowercase();
    separator_pattern().replace_all(&lowered, "-").into_owned()
}

/// Returns a slug for `value` that `exists` reports as unused.
///
/// The bare slug is tried first, then `-1`, `-2`, ... are appended until a
/// free label turns up.
pub fn slugify_unique<F>(value: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = slugify(value);
    let mut potential = base.clone();
    let mut suffix = 0usize;
    while exists(&potential) {
        suffix += 1;
        potential = format!("{base}-{suffix}");
    }
    potential
}
