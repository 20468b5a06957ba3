//! Provider configuration.
//!
//! A [`ProviderConfig`] is the static description of one named model
//! endpoint: which service hosts it, which model it runs, and how it is
//! expected to be used.

use billsight_fetch::{ConfigError, Endpoint, ProviderClient, read_credential};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::service::Service;

// ============================================================================
// Metadata
// ============================================================================

/// Relative latency of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    /// Sub-second to a few seconds.
    Fast,
    /// Several seconds.
    Medium,
    /// Tens of seconds.
    Slow,
}

/// How a provider is meant to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default primary.
    Primary,
    /// Default fallback.
    Fallback,
    /// Available, not used by default.
    Alternative,
}

impl fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Alternative => "alternative",
        })
    }
}

// ============================================================================
// Provider Config
// ============================================================================

/// A named model endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    /// Registry key, e.g. `openrouter_gemini`.
    pub name: &'static str,
    /// Hosting service.
    pub service: Service,
    /// Model identifier.
    pub model: &'static str,
    /// Whether the model accepts image input.
    pub supports_images: bool,
    /// Relative latency.
    pub speed: SpeedTier,
    /// Recommended role.
    pub role: Role,
    /// One-line description.
    pub description: &'static str,
}

impl ProviderConfig {
    /// Creates a new config builder.
    pub fn builder(name: &'static str, service: Service, model: &'static str) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(name, service, model)
    }

    /// Returns the base URL of the hosting service.
    pub fn base_url(&self) -> &'static str {
        self.service.api_base_url()
    }

    /// Returns the environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        self.service.api_key_env_var()
    }

    /// Returns true if the API key variable is set and non-blank.
    pub fn has_credentials(&self) -> bool {
        read_credential(self.api_key_env()).is_some()
    }

    /// Returns the endpoint description used by the HTTP client.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            name: self.name.to_string(),
            base_url: self.base_url().to_string(),
            model: self.model.to_string(),
            api_key_env: self.api_key_env().to_string(),
            supports_images: self.supports_images,
            expected_key_prefix: Some(self.service.key_prefix().to_string()),
        }
    }

    /// Builds a client, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the key is missing or the client cannot be
    /// built.
    pub fn build_client(&self, timeout: Duration) -> Result<ProviderClient, ConfigError> {
        ProviderClient::from_env(self.endpoint(), timeout)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ProviderConfig`].
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    /// Starts a vision-capable, medium speed, alternative-role config.
    pub fn new(name: &'static str, service: Service, model: &'static str) -> Self {
        Self {
            config: ProviderConfig {
                name,
                service,
                model,
                supports_images: true,
                speed: SpeedTier::Medium,
                role: Role::Alternative,
                description: "",
            },
        }
    }

    /// Sets whether the model accepts images.
    pub fn supports_images(mut self, supports: bool) -> Self {
        self.config.supports_images = supports;
        self
    }

    /// Sets the speed tier.
    pub fn speed(mut self, speed: SpeedTier) -> Self {
        self.config.speed = speed;
        self
    }

    /// Sets the recommended role.
    pub fn role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: &'static str) -> Self {
        self.config.description = description;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ProviderConfig::builder("x", Service::Groq, "m").build();
        assert!(config.supports_images);
        assert_eq!(config.role, Role::Alternative);
        assert_eq!(config.speed, SpeedTier::Medium);
    }

    #[test]
    fn test_endpoint_from_service() {
        let config = ProviderConfig::builder("openrouter_test", Service::OpenRouter, "a/b")
            .supports_images(false)
            .build();
        let endpoint = config.endpoint();
        assert_eq!(endpoint.name, "openrouter_test");
        assert_eq!(endpoint.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(endpoint.model, "a/b");
        assert_eq!(endpoint.api_key_env, "OPENROUTER_API_KEY");
        assert!(!endpoint.supports_images);
        assert_eq!(endpoint.expected_key_prefix.as_deref(), Some("sk-or-"));
    }
}
