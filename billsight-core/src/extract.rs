//! Lenient JSON extraction from model replies.
//!
//! Vision models are asked to answer with JSON only, but in practice they
//! wrap it in markdown fences or surround it with prose. [`extract`] tries a
//! fixed sequence of candidates and returns the first one that parses:
//!
//! 1. The whole reply.
//! 2. The interior of a language-tagged fence (```` ```json ````).
//! 3. The interior of any fence pair.
//! 4. The span from the first `{` to the last `}`.
//!
//! A candidate that is found but does not parse falls through to the next
//! step. When nothing parses, a [`ParseError`] carrying the raw reply is
//! returned.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;

// ============================================================================
// Regex Patterns
// ============================================================================

/// Fence opened with a language tag, e.g. ```` ```json ```` or ```` ```JSON ````.
static TAGGED_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z][A-Za-z0-9_+-]*[ \t]*(.*?)```").expect("Invalid regex")
});

/// Any fence pair.
static GENERIC_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("Invalid regex"));

// ============================================================================
// Extraction
// ============================================================================

/// Recovers a JSON document from free-form model output.
///
/// # Errors
///
/// Returns [`ParseError`] when none of the candidates parse.
pub fn extract(text: &str) -> Result<Value, ParseError> {
    let mut last_error = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    let candidates = [
        fenced_interior(&TAGGED_FENCE_RE, text),
        fenced_interior(&GENERIC_FENCE_RE, text),
        brace_span(text),
    ];

    for candidate in candidates.into_iter().flatten() {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(ParseError::new(
        format!("no valid JSON found in response ({last_error})"),
        text,
    ))
}

/// Recovers a JSON document and decodes it into `T`.
///
/// # Errors
///
/// Returns [`ParseError`] when no document is found or it does not match `T`.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let value = extract(text)?;
    serde_json::from_value(value)
        .map_err(|e| ParseError::new(format!("unexpected response shape: {e}"), text))
}

fn fenced_interior<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// ============================================================================
// Tests
// ============================================================================
