//! Check command - report which providers can run and whether storage is usable.

use anyhow::{Result, bail};
use billsight_fetch::{mask_secret, read_credential};
use billsight_providers::{ProviderConfig, ProviderRegistry};
use billsight_store::Settings;
use clap::Args;
use tracing::{debug, info};

use super::{load_settings, open_store};
use crate::output::{CheckOutput, JsonFormatter, ProviderCheck, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Check a single provider instead of all of them.
    #[arg(long, short)]
    pub provider: Option<String>,
}

/// Runs the check command.
///
/// Fails when the configured primary model has no credential or the settings
/// are invalid.
pub async fn run(args: &CheckArgs, cli: &Cli) -> Result<ExitCode> {
    let providers: Vec<&ProviderConfig> = match &args.provider {
        Some(name) => match ProviderRegistry::get(name) {
            Some(config) => vec![config],
            None => bail!(
                "Unknown provider: {name}. Available: {}",
                ProviderRegistry::names().join(", ")
            ),
        },
        None => ProviderRegistry::all().iter().collect(),
    };

    let settings = load_settings().await;
    let output = collect(&providers, &settings).await;
    info!(ok = output.ok, "Check complete");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_check(&output));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(if output.ok {
        ExitCode::Success
    } else {
        ExitCode::Error
    })
}

async fn collect(providers: &[&ProviderConfig], settings: &Settings) -> CheckOutput {
    let provider_checks: Vec<ProviderCheck> = providers
        .iter()
        .map(|config| {
            let key = read_credential(config.api_key_env());
            debug!(provider = config.name, found = key.is_some(), "Credential lookup");
            ProviderCheck {
                name: config.name.to_string(),
                api_key_env: config.api_key_env().to_string(),
                masked_key: key.as_deref().map(mask_secret),
                configured: key.is_some(),
                is_primary: config.name == settings.primary_model,
                is_fallback: settings.fallback_model.as_deref() == Some(config.name),
            }
        })
        .collect();

    let settings_error = settings
        .validate(ProviderRegistry::contains)
        .err()
        .map(|e| e.to_string());

    let primary_ready = ProviderRegistry::get(&settings.primary_model)
        .is_some_and(ProviderConfig::has_credentials);

    let fallback_ready = settings
        .fallback_model
        .as_deref()
        .map(|name| ProviderRegistry::get(name).is_some_and(ProviderConfig::has_credentials));

    let (database_bills, database_error) = match open_store(settings).await {
        Ok(store) => match store.statistics() {
            Ok(stats) => (Some(stats.total_bills), None),
            Err(e) => (None, Some(e.to_string())),
        },
        Err(e) => (None, Some(format!("{e:#}"))),
    };

    CheckOutput {
        ok: primary_ready && settings_error.is_none() && database_error.is_none(),
        primary_model: settings.primary_model.clone(),
        primary_ready,
        fallback_model: settings.fallback_model.clone(),
        fallback_ready,
        providers: provider_checks,
        settings_error,
        database_path: settings.database_path().display().to_string(),
        database_bills,
        database_error,
        output_dir: settings.output_dir().display().to_string(),
    }
}
