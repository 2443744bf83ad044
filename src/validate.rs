//! Field checks and text transforms shared by the user and recipe
//! write pipelines.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

pub const USERNAME_DENYLIST: &[&str] = &["admin", "dog", "cat"];
pub const TITLE_DENYLIST: &[&str] = &["uranium", "python", "iron"];

const ALLOWED_TAGS: &[&str] = &["b", "i", "u", "em", "strong"];

/// Case-insensitive substring check against a fixed denylist.
pub fn contains_denylisted(value: &str, denylist: &[&str]) -> bool {
    let lower = value.to_lowercase();
    denylist.iter().any(|word| lower.contains(word))
}

/// Lowercase, hyphen-separated form of the input.
pub fn slugify(value: &str) -> String {
    slug::slugify(value)
}

/// Strips markup down to an inline-formatting allow-list; disallowed tags
/// lose their markup, attributes are dropped entirely.
pub fn sanitize_markup(value: &str) -> String {
    ammonia::Builder::default()
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .generic_attributes(HashSet::new())
        .clean(value)
        .to_string()
}

/// The `$` -> `_` bio substitution has always been a pass-through (the
/// replaced string was never assigned back); that behavior is kept.
pub fn replace_dollar_sign(value: String) -> String {
    value
}

/// Year-difference age, no day-of-year adjustment.
pub fn age_in_years(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    today.year() - birthdate.year()
}
