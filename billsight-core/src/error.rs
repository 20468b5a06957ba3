//! Core error types for `BillSight`.

use thiserror::Error;

/// Maximum number of raw response characters echoed in error messages.
const RAW_PREVIEW_CHARS: usize = 200;

/// Core error type for `BillSight` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No structured payload could be recovered from model output.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Invalid data in a decoded payload.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A model reply that did not contain a recoverable JSON document.
///
/// The full raw text is kept so callers can log or surface it for debugging.
#[derive(Debug, Clone, Error)]
#[error("Failed to parse model response: {reason} (raw: {})", preview(.raw))]
pub struct ParseError {
    /// What went wrong with the last candidate that was tried.
    pub reason: String,
    /// The original, unmodified model output.
    pub raw: String,
}

impl ParseError {
    /// Creates a parse error for the given raw text.
    pub fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

fn preview(raw: &str) -> String {
    if raw.chars().count() <= RAW_PREVIEW_CHARS {
        return raw.to_string();
    }
    let cut: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
    format!("{cut}...")
}
