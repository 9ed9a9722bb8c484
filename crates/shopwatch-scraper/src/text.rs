//! Whitespace normalization and price parsing for free-form listing text.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use shopwatch_core::sites::DEFAULT_CURRENCY_PATTERN;

/// First number in the text. A grouped form (`1,250`, `1 250 000`) is
/// tried before a plain digit run so grouping separators are consumed.
static PRICE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:[, '’][0-9]{3})+(?:\.[0-9]+)?|[0-9]+(?:\.[0-9]+)?")
        .expect("valid price regex")
});

static DEFAULT_CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(DEFAULT_CURRENCY_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("valid default currency regex")
});

/// Result of [`parse_price`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    /// `None` when no number was found or it did not parse.
    pub value: Option<f64>,
    /// Matched currency token, or empty.
    pub currency: String,
    /// The whitespace-normalized input, kept regardless of parse success.
    pub raw_text: String,
}

/// Collapses every run of whitespace to one space and trims both ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The built-in Egyptian-pound pattern, case-insensitive.
#[must_use]
pub fn default_currency_pattern() -> &'static Regex {
    &DEFAULT_CURRENCY
}

/// Extracts a numeric price and currency token from listing text.
///
/// Grouping separators are stripped before parsing. Arabic-Indic digits and
/// Arabic separators are read as their ASCII equivalents. Malformed numbers
/// degrade to `value: None`; this never fails.
#[must_use]
pub fn parse_price(text: &str, currency_pattern: &Regex) -> ParsedPrice {
    let raw_text = normalize_whitespace(text);
    let ascii = to_ascii_digits(&raw_text);

    let value = PRICE_NUMBER.find(&ascii).and_then(|m| {
        let digits: String = m
            .as_str()
            .chars()
            .filter(|c| !matches!(c, ',' | ' ' | '\'' | '’'))
            .collect();
        digits.parse::<f64>().ok()
    });

    let currency = currency_pattern
        .find(&raw_text)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default();

    ParsedPrice {
        value,
        currency,
        raw_text,
    }
}

fn to_ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => arabic_digit(c, '\u{0660}'),
            '\u{06F0}'..='\u{06F9}' => arabic_digit(c, '\u{06F0}'),
            '\u{066B}' => '.',
            '\u{066C}' => ',',
            other => other,
        })
        .collect()
}

fn arabic_digit(c: char, zero: char) -> char {
    char::from_digit(u32::from(c) - u32::from(zero), 10).unwrap_or(c)
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;
