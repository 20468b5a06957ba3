//! Config command - manage configuration.

use anyhow::{Result, bail};
use billsight_providers::ProviderRegistry;
use billsight_store::{SettingsStore, default_config_dir, default_settings_path};
use clap::{Args, Subcommand};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration and data paths.
    Path,

    /// Set the primary model.
    Primary {
        /// Registry name of the model.
        model: String,
    },

    /// Set the fallback model, or "none" to disable it.
    Fallback {
        /// Registry name of the model, or "none".
        model: String,
    },

    /// Set the minimum extraction confidence.
    MinConfidence {
        /// Value between 0.0 and 1.0.
        value: f64,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli).await,
        ConfigAction::Primary { model } => set_primary(model).await,
        ConfigAction::Fallback { model } => set_fallback(model).await,
        ConfigAction::MinConfidence { value } => set_min_confidence(*value).await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("BillSight Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Primary model:   {}", settings.primary_model);
            println!(
                "Fallback model:  {}",
                settings.fallback_model.as_deref().unwrap_or("(disabled)")
            );
            println!();
            println!("Confidence thresholds:");
            println!("  minimum:       {:.2}", settings.min_confidence);
            println!("  good:          {:.2}", settings.good_confidence);
            println!("  excellent:     {:.2}", settings.excellent_confidence);
            println!("  high item:     {:.2}", settings.high_item_confidence);
            println!();
            println!("Request timeout: {}s", settings.request_timeout_secs);
            println!("Max file size:   {}MB", settings.max_file_size_mb);
            println!("Max dimension:   {}px", settings.max_image_dimension);
            println!("Log level:       {}", settings.log_level);

            if let Err(e) = settings.validate(ProviderRegistry::contains) {
                println!();
                println!("Warning: {e}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

async fn show_paths(cli: &Cli) -> Result<()> {
    let settings = SettingsStore::load_default().await.get().await;
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();
    let database = settings.database_path();
    let outputs = settings.output_dir();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Database:      {}", database.display());
            println!("Outputs:       {}", outputs.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "database": database.display().to_string(),
                "output_dir": outputs.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

/// Applies `change`, validates the result and saves it.
async fn update_and_save(change: impl FnOnce(&mut billsight_store::Settings)) -> Result<()> {
    let store = SettingsStore::load_default().await;
    store.update(change).await;
    store.get().await.validate(ProviderRegistry::contains)?;
    store.save().await?;
    Ok(())
}

async fn set_primary(model: &str) -> Result<()> {
    if !ProviderRegistry::contains(model) {
        bail!(
            "Unknown model: {model}. Available: {}",
            ProviderRegistry::names().join(", ")
        );
    }

    let name = model.to_string();
    update_and_save(move |s| s.primary_model = name).await?;

    info!(model, "Primary model updated");
    println!("Primary model set to: {model}");
    Ok(())
}

async fn set_fallback(model: &str) -> Result<()> {
    let fallback = match model.to_lowercase().as_str() {
        "none" | "off" | "disabled" => None,
        _ if ProviderRegistry::contains(model) => Some(model.to_string()),
        _ => bail!(
            "Unknown model: {model}. Use \"none\" or one of: {}",
            ProviderRegistry::names().join(", ")
        ),
    };

    let shown = fallback.clone();
    update_and_save(move |s| s.fallback_model = fallback).await?;

    match shown {
        Some(name) => {
            info!(model = %name, "Fallback model updated");
            println!("Fallback model set to: {name}");
        }
        None => {
            info!("Fallback model disabled");
            println!("Fallback model disabled");
        }
    }
    Ok(())
}

async fn set_min_confidence(value: f64) -> Result<()> {
    update_and_save(move |s| s.min_confidence = value).await?;

    info!(value, "Minimum confidence updated");
    println!("Minimum confidence set to: {value:.2}");
    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
