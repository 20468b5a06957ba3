//! Provider and configuration error types.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Provider Error
// ============================================================================

/// Classification of a failed provider call.
///
/// The kind is informational: every kind triggers fallback the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Credential rejected (401/403).
    Unauthorized,
    /// Model or endpoint not found (404).
    NotFound,
    /// Rate limited (429).
    RateLimited,
    /// Deadline expired or transport timed out.
    Timeout,
    /// Anything else.
    Unknown,
}

impl ProviderErrorKind {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Returns the snake-case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to one provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider} failed ({kind}): {message}")]
pub struct ProviderError {
    /// Failure classification.
    pub kind: ProviderErrorKind,
    /// Registry name of the provider that failed.
    pub provider: String,
    /// Human-readable detail.
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error.
    pub fn new(
        kind: ProviderErrorKind,
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an `Unknown` error.
    pub fn unknown(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, provider, message)
    }

    /// Creates a `Timeout` error for an expired deadline.
    pub fn timeout(provider: impl Into<String>, after: Duration) -> Self {
        Self::new(
            ProviderErrorKind::Timeout,
            provider,
            format!("no response within {}s", after.as_secs_f64()),
        )
    }

    /// Classifies a transport-level failure.
    pub fn from_transport(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if let Some(status) = err.status() {
            ProviderErrorKind::from_status(status)
        } else {
            ProviderErrorKind::Unknown
        };
        Self::new(kind, provider, err.to_string())
    }
}

// ============================================================================
// Config Error
// ============================================================================

/// Error constructing a provider client or manager.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Credential environment variable absent or blank.
    #[error("Missing API key for {provider}: set the {env_var} environment variable")]
    MissingCredential {
        /// Provider name.
        provider: String,
        /// Environment variable that was checked.
        env_var: String,
    },

    /// Provider name not in the registry.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Base URL could not be parsed.
    #[error("Invalid endpoint for {provider}: {reason}")]
    InvalidEndpoint {
        /// Provider name.
        provider: String,
        /// Parse failure.
        reason: String,
    },

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ProviderErrorKind::from_status(StatusCode::UNAUTHORIZED),
            ProviderErrorKind::Unauthorized
        );
        assert_eq!(
            ProviderErrorKind::from_status(StatusCode::FORBIDDEN),
            ProviderErrorKind::Unauthorized
        );
        assert_eq!(
            ProviderErrorKind::from_status(StatusCode::NOT_FOUND),
            ProviderErrorKind::NotFound
        );
        assert_eq!(
            ProviderErrorKind::from_status(StatusCode::TOO_MANY_REQUESTS),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderErrorKind::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            ProviderErrorKind::Unknown
        );
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::new(ProviderErrorKind::RateLimited, "groq_llama_scout", "slow down");
        assert_eq!(err.to_string(), "groq_llama_scout failed (rate_limited): slow down");

        let err = ProviderError::timeout("openrouter_gemini", Duration::from_secs(60));
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
        assert!(err.message.contains("60s"));
    }

    #[test]
    fn test_missing_credential_names_env_var() {
        let err = ConfigError::MissingCredential {
            provider: "openrouter_gemini".to_string(),
            env_var: "OPENROUTER_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));
    }
}
