//! Localized price text to major currency units.
//!
//! Listing prices come as `"2.499<sup>99</sup> Lei"` rendered to text, i.e.
//! `"2.49999 Lei"` or `"2.499,99 Lei"`: the digits are the amount in minor
//! units (bani) with group separators sprinkled in. Every separator occurrence
//! is stripped before parsing, so `"1.234.567,89 Lei"` is read correctly.

use thiserror::Error;
use tracing::warn;

/// Currency marker printed after every amount
pub const CURRENCY_MARKER: &str = "Lei";

const SEPARATORS: [char; 4] = ['.', ',', ' ', '\u{a0}'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("Price text is empty")]
    Empty,

    #[error("Price text '{raw}' contains non-digit characters")]
    InvalidDigits { raw: String },

    #[error("Price text '{raw}' overflows the supported range")]
    Overflow { raw: String },
}

/// Parse a mandatory price
pub fn parse_price(raw: &str) -> Result<f64, PriceParseError> {
    parse_minor_units(raw).map(|minor| minor as f64 / 100.0)
}

/// Parse a strikethrough price.
///
/// Absent, empty and whitespace-only text means no discount is shown. Text that
/// is present but unreadable is logged and treated the same way.
pub fn parse_old_price(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    match parse_price(raw) {
        Ok(price) => Some(price),
        Err(e) => {
            warn!("Ignoring unreadable old price: {}", e);
            None
        }
    }
}

/// Amount in minor units (1/100 of the currency)
pub fn parse_minor_units(raw: &str) -> Result<u64, PriceParseError> {
    let amount = raw
        .find(CURRENCY_MARKER)
        .map_or(raw, |marker_at| &raw[..marker_at]);

    let lowered = amount.to_lowercase();
    let without_currency = lowered.replace(&CURRENCY_MARKER.to_lowercase(), "");
    let digits: String = without_currency
        .trim()
        .chars()
        .filter(|c| !SEPARATORS.contains(c))
        .collect();

    if digits.is_empty() {
        return Err(PriceParseError::Empty);
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PriceParseError::InvalidDigits {
            raw: raw.trim().to_string(),
        });
    }

    digits.parse::<u64>().map_err(|_| PriceParseError::Overflow {
        raw: raw.trim().to_string(),
    })
}
