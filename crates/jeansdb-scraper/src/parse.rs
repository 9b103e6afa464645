//! Text primitives for price, size and composition fields.
//!
//! All functions are pure and return `None` when the input does not carry
//! the value, so callers decide what is required.

use std::sync::LazyLock;

use regex::Regex;

static SIZE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{3})cm").expect("valid regex"));
static SIZE_MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}").expect("valid regex"));
static TRAILING_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9]+)[^A-Za-z0-9]*$").expect("valid regex"));
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Lowercases a display label and joins its words with underscores.
///
/// Newlines, carriage returns and tabs are removed before trimming, and each
/// remaining space becomes `_`: `"  Slim Jeans\n"` → `"slim_jeans"`.
#[must_use]
pub fn snake_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
        .to_lowercase()
}

/// Parses a price block such as `"$ 49.90"` or `"\n$24.99\n"`.
///
/// Whitespace anywhere in the text is removed, then any leading currency
/// marker (anything before the first digit, sign or decimal point).
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let number =
        compact.trim_start_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')));
    number.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Three-digit centimeter measurement, e.g. `"Length 105cm"` → `"105"`.
#[must_use]
pub fn parse_size_number(size: &str) -> Option<String> {
    SIZE_NUMBER_RE
        .captures(size)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Model size, in priority order:
/// 1. the first `NN/NN` pair (`"wears a size 32/32"` → `"32/32"`);
/// 2. otherwise the trailing alphanumeric token (`"wears a size M"` → `"M"`).
#[must_use]
pub fn parse_size_model(size: &str) -> Option<String> {
    if let Some(m) = SIZE_MODEL_RE.find(size) {
        return Some(m.as_str().to_owned());
    }
    TRAILING_TOKEN_RE
        .captures(size)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Splits composition text on commas and trims each segment.
#[must_use]
pub fn composition_segments(composition: &str) -> Vec<&str> {
    composition
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// First integer in a composition segment as a fraction:
/// `"98% Cotton"` → `0.98`, `"Spandex 2%"` → `0.02`.
#[must_use]
pub fn parse_fraction(segment: &str) -> Option<f64> {
    let digits = INTEGER_RE.find(segment)?.as_str();
    digits.parse::<u32>().ok().map(|pct| f64::from(pct) / 100.0)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
