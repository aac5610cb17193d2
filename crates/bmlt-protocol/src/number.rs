//! Number to string normalization.
//!
//! Every record stores its fields as strings so they can be diffed and
//! echoed back as query parameters; numbers are rendered in their shortest
//! decimal form.

use serde_json::Number;

/// Most fractional digits kept for non-integers.
pub const MAX_FRACTION_DIGITS: usize = 12;

/// Renders a JSON number as its minimal decimal string.
///
/// Integral values never carry a trailing `.0`; other values keep at most
/// [`MAX_FRACTION_DIGITS`] fractional digits with trailing zeros removed.
pub fn normalize_number(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    number.as_f64().map(normalize_float).unwrap_or_default()
}

/// Float counterpart of [`normalize_number`].
pub fn normalize_float(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return (value as i64).to_string();
    }
    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        t => t.to_string(),
    }
}
