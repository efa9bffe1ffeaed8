//! Per-field conversions from display text to typed values.
//!
//! Each conversion returns `None` when the text does not carry a usable
//! value; the caller drops such rows.

use std::sync::LazyLock;

use regex::Regex;

/// First `digits.digits` run, e.g. `3.9` in `"Rating: ⭐ 3.9 / 5"`.
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]+").expect("valid regex"));

/// First integer run, e.g. `3` in `"3 Colors"`.
static COLORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Parses the first decimal number of a rating line.
pub fn rating(text: &str) -> Option<f64> {
    RATING_RE.find(text)?.as_str().parse().ok()
}

/// Parses the first integer of a colors line. Overflow counts as missing.
pub fn colors(text: &str) -> Option<i64> {
    COLORS_RE.find(text)?.as_str().parse().ok()
}

/// Parses `"$102.15"` into `102.15 * rate`.
///
/// NaN counts as missing.
pub fn price(text: &str, currency_symbol: &str, rate: f64) -> Option<f64> {
    let text = text.trim();
    let amount = text.strip_prefix(currency_symbol).unwrap_or(text).trim();
    amount
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
        .map(|value| value * rate)
}

/// Removes `prefix` if present, otherwise returns the text unchanged.
pub fn strip_prefix(text: &str, prefix: &str) -> String {
    text.strip_prefix(prefix).unwrap_or(text).to_owned()
}
