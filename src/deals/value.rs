//! Currency-range parsing for free-form `valueRange` strings.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Strategy used to turn a `valueRange` string into a number. A query picks
/// exactly one and uses it for filtering, sorting and aggregation alike.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueParser {
    /// Drop every non-digit from the whole string and read what remains as
    /// one integer: `"$50K-100K"` becomes `50100`.
    #[default]
    Digits,
    /// Read the first numeric token and scale it by a trailing `K` or `M`:
    /// `"$50K-100K"` becomes `50000`.
    Suffix,
}

impl ValueParser {
    pub fn parse(self, raw: &str) -> u64 {
        match self {
            Self::Digits => parse_digits(raw),
            Self::Suffix => parse_with_suffix(raw),
        }
    }
}

impl Display for ValueParser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Digits => write!(f, "digits"),
            Self::Suffix => write!(f, "suffix"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown value parsing strategy: {0}")]
pub struct ValueParserParseError(pub String);

impl FromStr for ValueParser {
    type Err = ValueParserParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digits" | "literal" | "strip" => Ok(Self::Digits),
            "suffix" | "scaled" => Ok(Self::Suffix),
            _ => Err(ValueParserParseError(s.to_string())),
        }
    }
}

/// Saturates at `u64::MAX` for digit runs too long to fit.
pub fn parse_digits(raw: &str) -> u64 {
    raw.bytes()
        .filter(u8::is_ascii_digit)
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        })
}

pub fn parse_with_suffix(raw: &str) -> u64 {
    let bytes = raw.as_bytes();
    let Some(start) = bytes.iter().position(u8::is_ascii_digit) else {
        return 0;
    };

    let mut whole: u128 = 0;
    let mut fraction: u128 = 0;
    let mut fraction_scale: u128 = 1;
    let mut in_fraction = false;
    let mut idx = start;
    while idx < bytes.len() {
        match bytes[idx] {
            b @ b'0'..=b'9' => {
                let digit = u128::from(b - b'0');
                if !in_fraction {
                    whole = whole.saturating_mul(10).saturating_add(digit);
                } else if fraction_scale < 1_000_000_000 {
                    fraction = fraction * 10 + digit;
                    fraction_scale *= 10;
                }
            }
            b',' if !in_fraction => {}
            b'.' if !in_fraction => in_fraction = true,
            _ => break,
        }
        idx += 1;
    }

    // the suffix must follow the number directly so "5 months" stays 5
    let multiplier: u128 = match bytes.get(idx) {
        Some(b'k' | b'K') => 1_000,
        Some(b'm' | b'M') => 1_000_000,
        _ => 1,
    };
    let value = whole
        .saturating_mul(multiplier)
        .saturating_add(fraction * multiplier / fraction_scale);
    u64::try_from(value).unwrap_or(u64::MAX)
}
