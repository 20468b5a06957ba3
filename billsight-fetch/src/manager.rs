//! Primary/fallback orchestration over two model endpoints.
//!
//! The manager tries the primary provider once and, if it fails for any
//! reason, the secondary provider once. Each attempt runs under a deadline.
//! Provider errors never escape: every call returns a [`CallResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::{ProviderError, ProviderErrorKind};
use crate::host::http::DEFAULT_TIMEOUT_SECS;
use crate::model::{ModelRequest, VisionModel};

// ============================================================================
// Call Attempt
// ============================================================================

/// Record of a single provider attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CallAttempt {
    /// Provider that was tried.
    pub provider: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Error message if the attempt failed.
    pub error: Option<String>,
    /// Error classification if the attempt failed.
    pub kind: Option<ProviderErrorKind>,
    /// How long the attempt took.
    pub duration: Duration,
}

impl CallAttempt {
    /// Creates a successful attempt record.
    pub fn success(provider: impl Into<String>, duration: Duration) -> Self {
        Self {
            provider: provider.into(),
            success: true,
            error: None,
            kind: None,
            duration,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(error: &ProviderError, duration: Duration) -> Self {
        Self {
            provider: error.provider.clone(),
            success: false,
            error: Some(error.to_string()),
            kind: Some(error.kind),
            duration,
        }
    }
}

// ============================================================================
// Call Result
// ============================================================================

/// Outcome of one [`ModelManager::call_with_fallback`] invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    /// Whether some provider answered.
    pub success: bool,
    /// Raw completion text on success.
    pub text: Option<String>,
    /// Failure detail; references every provider that was tried.
    pub error: Option<String>,
    /// Provider that answered.
    pub model_used: Option<String>,
    /// True if the secondary provider was tried.
    pub fallback_used: bool,
    /// Primary failure, kept for diagnostics when the secondary was tried.
    pub primary_error: Option<String>,
    /// Wall-clock time from start to final outcome.
    pub elapsed: Duration,
    /// Every attempt, in order.
    pub attempts: Vec<CallAttempt>,
}

impl CallResult {
    /// Returns true if some provider answered.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns the number of providers that were tried.
    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }

    /// Returns the error kinds of the failed attempts.
    pub fn error_kinds(&self) -> Vec<ProviderErrorKind> {
        self.attempts.iter().filter_map(|a| a.kind).collect()
    }
}

// ============================================================================
// Model Manager
// ============================================================================

/// Owns a primary and an optional secondary [`VisionModel`].
#[derive(Clone)]
pub struct ModelManager {
    primary: Arc<dyn VisionModel>,
    fallback: Option<Arc<dyn VisionModel>>,
    deadline: Duration,
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|m| m.name()))
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl ModelManager {
    /// Creates a manager with the default per-call deadline.
    pub fn new(primary: Arc<dyn VisionModel>, fallback: Option<Arc<dyn VisionModel>>) -> Self {
        Self {
            primary,
            fallback,
            deadline: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the primary provider name.
    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    /// Returns the secondary provider name, if configured.
    pub fn fallback_name(&self) -> Option<&str> {
        self.fallback.as_deref().map(VisionModel::name)
    }

    /// Returns the per-call deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Calls the primary provider, falling back to the secondary on any
    /// failure. Each provider is tried at most once.
    #[instrument(skip(self, request), fields(kind = %request.kind, primary = %self.primary.name()))]
    pub async fn call_with_fallback(&self, request: &ModelRequest) -> CallResult {
        let start = Instant::now();
        let mut attempts = Vec::with_capacity(2);

        let primary_outcome = self.attempt(self.primary.as_ref(), request, &mut attempts).await;
        let primary_error = match primary_outcome {
            Ok(text) => {
                info!(provider = %self.primary.name(), elapsed = ?start.elapsed(), "Primary provider answered");
                return CallResult {
                    success: true,
                    text: Some(text),
                    error: None,
                    model_used: Some(self.primary.name().to_string()),
                    fallback_used: false,
                    primary_error: None,
                    elapsed: start.elapsed(),
                    attempts,
                };
            }
            Err(e) => e,
        };

        let Some(fallback) = self.fallback.as_deref() else {
            warn!(error = %primary_error, "Primary provider failed and no fallback is configured");
            return CallResult {
                success: false,
                text: None,
                error: Some(primary_error.to_string()),
                model_used: None,
                fallback_used: false,
                primary_error: None,
                elapsed: start.elapsed(),
                attempts,
            };
        };

        info!(
            primary = %self.primary.name(),
            fallback = %fallback.name(),
            kind = %primary_error.kind,
            "Primary provider failed, trying fallback"
        );

        let fallback_outcome = self.attempt(fallback, request, &mut attempts).await;
        match fallback_outcome {
            Ok(text) => {
                info!(provider = %fallback.name(), elapsed = ?start.elapsed(), "Fallback provider answered");
                CallResult {
                    success: true,
                    text: Some(text),
                    error: None,
                    model_used: Some(fallback.name().to_string()),
                    fallback_used: true,
                    primary_error: Some(primary_error.to_string()),
                    elapsed: start.elapsed(),
                    attempts,
                }
            }
            Err(fallback_error) => {
                warn!("Both providers failed");
                CallResult {
                    success: false,
                    text: None,
                    error: Some(format!(
                        "All providers failed. Primary: {primary_error}. Fallback: {fallback_error}"
                    )),
                    model_used: None,
                    fallback_used: true,
                    primary_error: Some(primary_error.to_string()),
                    elapsed: start.elapsed(),
                    attempts,
                }
            }
        }
    }

    async fn attempt(
        &self,
        model: &dyn VisionModel,
        request: &ModelRequest,
        attempts: &mut Vec<CallAttempt>,
    ) -> Result<String, ProviderError> {
        let attempt_start = Instant::now();
        debug!(provider = %model.name(), "Invoking provider");

        let result = match tokio::time::timeout(self.deadline, model.invoke(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(model.name(), self.deadline)),
        };

        let duration = attempt_start.elapsed();
        match &result {
            Ok(_) => attempts.push(CallAttempt::success(model.name(), duration)),
            Err(e) => {
                warn!(provider = %model.name(), error = %e, duration = ?duration, "Provider attempt failed");
                attempts.push(CallAttempt::failure(e, duration));
            }
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
