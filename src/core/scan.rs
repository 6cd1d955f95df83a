//! Receipt scan parsing - extracts a total amount from scanned text.
//!
//! The camera/OCR collaborator delivers free-form receipt text (or a raw
//! barcode string); this module is the pure boundary function that pulls the
//! total out of it. Matching is line-oriented free text, so the pattern is
//! forgiving: a label, an optional currency symbol, then digits with
//! separators.

use regex::Regex;
use std::sync::LazyLock;

/// Matches "Total", "Amount Due", "Total Due", or "Sum", an optional
/// non-digit (currency symbol), then the amount digits with separators.
static TOTAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Total|Amount Due|Total Due|Sum)\s*\D?\s*([\d.,]+)")
        .unwrap_or_else(|err| panic!("invalid total-amount pattern: {err}"))
});

/// Extracts the first total amount from scanned receipt text.
///
/// Thousands-separator commas are stripped before parsing. Returns `None`
/// when no labeled amount is present or the digits do not parse.
#[must_use]
pub fn extract_amount(text: &str) -> Option<f64> {
    let captures = TOTAL_PATTERN.captures(text)?;
    let digits = captures.get(1)?.as_str().replace(',', "");
    digits.parse::<f64>().ok()
}
