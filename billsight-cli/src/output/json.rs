//! JSON output formatting.

use anyhow::Result;
use billsight_providers::ProviderConfig;
use billsight_store::{StoredBill, StoredLineItem};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Provider info output.
#[derive(Debug, Serialize)]
pub struct ProviderInfoOutput {
    pub name: String,
    pub service: String,
    pub model: String,
    pub supports_images: bool,
    pub speed: String,
    pub role: String,
    pub description: String,
    pub api_key_env: String,
    pub has_credentials: bool,
}

impl From<&ProviderConfig> for ProviderInfoOutput {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.to_string(),
            service: config.service.to_string(),
            model: config.model.to_string(),
            supports_images: config.supports_images,
            speed: config.speed.to_string(),
            role: config.role.to_string(),
            description: config.description.to_string(),
            api_key_env: config.api_key_env().to_string(),
            has_credentials: config.has_credentials(),
        }
    }
}

/// Credential status of one provider.
#[derive(Debug, Serialize)]
pub struct ProviderCheck {
    pub name: String,
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_key: Option<String>,
    pub configured: bool,
    pub is_primary: bool,
    pub is_fallback: bool,
}

/// Result of the check command.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub ok: bool,
    pub primary_model: String,
    pub primary_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_model: Option<String>,
    /// `None` when no fallback is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_ready: Option<bool>,
    pub providers: Vec<ProviderCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_error: Option<String>,
    pub database_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_bills: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_error: Option<String>,
    pub output_dir: String,
}

/// A stored bill with its line items.
#[derive(Debug, Serialize)]
pub struct BillDetailOutput {
    #[serde(flatten)]
    pub bill: StoredBill,
    pub items: Vec<StoredLineItem>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the provider list.
    pub fn format_providers(&self, providers: &[ProviderConfig]) -> Result<String> {
        let outputs: Vec<ProviderInfoOutput> =
            providers.iter().map(ProviderInfoOutput::from).collect();
        self.format(&outputs)
    }
}

// ============================================================================
// Tests
// ============================================================================
