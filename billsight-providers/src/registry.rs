//! Provider registry.
//!
//! The registry provides static access to every configured model endpoint,
//! keyed by name.

use std::sync::OnceLock;

use crate::config::{ProviderConfig, Role};
use crate::groq::groq_llama_scout;
use crate::openrouter::{openrouter_gemini, openrouter_llama_vision, openrouter_qwen};

// ============================================================================
// Static Registry
// ============================================================================

/// Static storage for all provider configs.
static PROVIDERS: OnceLock<Vec<ProviderConfig>> = OnceLock::new();

/// Initializes all provider configs, defaults first.
fn init_providers() -> Vec<ProviderConfig> {
    vec![
        openrouter_gemini(),
        groq_llama_scout(),
        openrouter_llama_vision(),
        openrouter_qwen(),
    ]
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of provider configs.
///
/// Initialized lazily on first access; immutable afterwards.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider configs.
    pub fn all() -> &'static [ProviderConfig] {
        PROVIDERS.get_or_init(init_providers)
    }

    /// Looks up a provider by name.
    pub fn get(name: &str) -> Option<&'static ProviderConfig> {
        Self::all().iter().find(|p| p.name == name)
    }

    /// Returns true if `name` is registered.
    pub fn contains(name: &str) -> bool {
        Self::get(name).is_some()
    }

    /// Returns all provider names in registry order.
    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|p| p.name).collect()
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns the default primary provider.
    pub fn default_primary() -> &'static ProviderConfig {
        Self::with_role(Role::Primary)
            .next()
            .unwrap_or(&Self::all()[0])
    }

    /// Returns the default fallback provider, if one is marked.
    pub fn default_fallback() -> Option<&'static ProviderConfig> {
        Self::with_role(Role::Fallback).next()
    }

    /// Returns providers that accept image input.
    pub fn vision_capable() -> Vec<&'static ProviderConfig> {
        Self::all().iter().filter(|p| p.supports_images).collect()
    }

    fn with_role(role: Role) -> impl Iterator<Item = &'static ProviderConfig> {
        Self::all().iter().filter(move |p| p.role == role)
    }
}

// ============================================================================
// Tests
// ============================================================================
