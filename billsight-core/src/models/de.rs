//! Lenient conversions for loosely-typed model output.
//!
//! Models return numbers as strings ("$3.50"), booleans as "yes", and lists
//! of objects where strings were asked for. These helpers turn a raw
//! [`Value`] into the scalar we want, or `None` when it cannot be read.

use serde_json::Value;

/// Reads a number, accepting numeric strings with currency symbols and
/// thousands separators.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Reads a non-empty string; numbers are rendered as text.
pub(crate) fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a boolean, accepting the usual textual spellings.
pub(crate) fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    }
}

/// Reads a count, rounding fractional values and rejecting negatives.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn as_count(value: &Value) -> Option<usize> {
    as_f64(value).filter(|f| *f >= 0.0).map(|f| f.round() as usize)
}

/// Reads a list of strings. Non-string entries are rendered as compact JSON.
pub(crate) fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(_) | Value::Number(_) => as_string(item),
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(_) => as_string(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Clamps a confidence value into `[0, 1]`.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
