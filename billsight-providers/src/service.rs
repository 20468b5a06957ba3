//! Hosted inference services.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An OpenAI-compatible hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// openrouter.ai
    OpenRouter,
    /// groq.com
    Groq,
}

impl Service {
    /// Returns the service name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
        }
    }

    /// Returns the OpenAI-compatible base URL.
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Returns the environment variable for the API key.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }

    /// Returns the prefix keys for this service start with.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::OpenRouter => "sk-or-",
            Self::Groq => "gsk_",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_endpoints() {
        assert_eq!(Service::OpenRouter.api_key_env_var(), "OPENROUTER_API_KEY");
        assert_eq!(Service::Groq.api_key_env_var(), "GROQ_API_KEY");
        assert!(Service::Groq.api_base_url().starts_with("https://api.groq.com"));
        assert_eq!(Service::OpenRouter.key_prefix(), "sk-or-");
    }
}
