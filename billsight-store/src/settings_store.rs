//! User preferences store.
//!
//! Settings live in a single JSON file. Every field has a default, so an old
//! or hand-edited file with missing keys still loads.

use billsight_core::ConfidenceThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{
    default_database_path, default_output_dir, default_settings_path, load_json, save_json,
};

/// Registry name of the default primary model.
pub const DEFAULT_PRIMARY_MODEL: &str = "openrouter_gemini";

/// Registry name of the default fallback model.
pub const DEFAULT_FALLBACK_MODEL: &str = "groq_llama_scout";

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Registry name of the model tried first.
    pub primary_model: String,

    /// Registry name of the model tried when the primary fails.
    pub fallback_model: Option<String>,

    /// Extractions scoring below this are rejected.
    pub min_confidence: f64,

    /// Lower bound of the "good" quality tier.
    pub good_confidence: f64,

    /// Lower bound of the "excellent" quality tier.
    pub excellent_confidence: f64,

    /// Item confidence counted as high in quality metrics.
    pub high_item_confidence: f64,

    /// Deadline for a single provider call.
    pub request_timeout_secs: u64,

    /// Largest accepted input file.
    pub max_file_size_mb: u64,

    /// Longest edge an image is scaled down to before upload.
    pub max_image_dimension: u32,

    /// SQLite database location (defaults under the data directory).
    pub database_path: Option<PathBuf>,

    /// Where processing records are written (defaults under the data directory).
    pub output_dir: Option<PathBuf>,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        let thresholds = ConfidenceThresholds::default();
        Self {
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            min_confidence: thresholds.minimum,
            good_confidence: thresholds.good,
            excellent_confidence: thresholds.excellent,
            high_item_confidence: thresholds.high_item,
            request_timeout_secs: 60,
            max_file_size_mb: 10,
            max_image_dimension: 2048,
            database_path: None,
            output_dir: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Returns the quality thresholds.
    pub fn thresholds(&self) -> ConfidenceThresholds {
        ConfidenceThresholds {
            minimum: self.min_confidence,
            good: self.good_confidence,
            excellent: self.excellent_confidence,
            high_item: self.high_item_confidence,
        }
    }

    /// Returns the per-call deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the file size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Returns the configured database path or the default one.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(default_database_path)
    }

    /// Returns the configured output directory or the default one.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(default_output_dir)
    }

    /// Checks the settings for internal consistency.
    ///
    /// `is_known_model` answers whether a name exists in the model registry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSettings`] describing the first problem.
    pub fn validate(&self, is_known_model: impl Fn(&str) -> bool) -> Result<(), StoreError> {
        let thresholds = [
            ("min_confidence", self.min_confidence),
            ("good_confidence", self.good_confidence),
            ("excellent_confidence", self.excellent_confidence),
            ("high_item_confidence", self.high_item_confidence),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(StoreError::InvalidSettings(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(StoreError::InvalidSettings(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_file_size_mb == 0 {
            return Err(StoreError::InvalidSettings(
                "max_file_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.max_image_dimension == 0 {
            return Err(StoreError::InvalidSettings(
                "max_image_dimension must be greater than 0".to_string(),
            ));
        }

        if !is_known_model(&self.primary_model) {
            return Err(StoreError::InvalidSettings(format!(
                "unknown primary model: {}",
                self.primary_model
            )));
        }
        if let Some(fallback) = &self.fallback_model {
            if fallback == &self.primary_model {
                return Err(StoreError::InvalidSettings(
                    "fallback model must differ from the primary model".to_string(),
                ));
            }
            if !is_known_model(fallback) {
                return Err(StoreError::InvalidSettings(format!(
                    "unknown fallback model: {fallback}"
                )));
            }
        }

        Ok(())
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Settings bound to the file they were loaded from.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store with default settings for `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing file yields defaults. An unreadable or malformed file is
    /// logged and also yields defaults.
    pub async fn load(path: PathBuf) -> Self {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Applies `f` to the settings in memory.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Restores defaults in memory.
    pub async fn reset(&self) {
        *self.settings.write().await = Settings::default();
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(name: &str) -> bool {
        matches!(name, "openrouter_gemini" | "groq_llama_scout" | "openrouter_qwen")
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate(known).is_ok());
        assert_eq!(settings.thresholds(), ConfidenceThresholds::default());
        assert_eq!(settings.request_timeout(), Duration::from_secs(60));
        assert_eq!(settings.max_file_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let settings = Settings {
            min_confidence: 1.2,
            ..Settings::default()
        };
        let err = settings.validate(known).unwrap_err();
        assert!(err.to_string().contains("min_confidence"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate(known).is_err());
    }

    #[test]
    fn test_unknown_primary_rejected() {
        let settings = Settings {
            primary_model: "gpt-4o".to_string(),
            ..Settings::default()
        };
        let err = settings.validate(known).unwrap_err();
        assert!(err.to_string().contains("gpt-4o"));
    }

    #[test]
    fn test_fallback_equal_to_primary_rejected() {
        let settings = Settings {
            fallback_model: Some(DEFAULT_PRIMARY_MODEL.to_string()),
            ..Settings::default()
        };
        assert!(settings.validate(known).is_err());
    }

    #[test]
    fn test_no_fallback_is_valid() {
        let settings = Settings {
            fallback_model: None,
            ..Settings::default()
        };
        assert!(settings.validate(known).is_ok());
    }
}
