//! Providers command - list registered model providers.

use anyhow::Result;
use billsight_providers::ProviderRegistry;
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the providers command.
pub fn run(cli: &Cli) -> Result<()> {
    info!("Listing providers");

    let providers = ProviderRegistry::all();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_providers_header());
            println!("{}", "─".repeat(78));

            for config in providers {
                println!("{}", formatter.format_provider_line(config));
            }

            println!();
            println!(
                "Total: {} providers ({} with credentials)",
                providers.len(),
                providers.iter().filter(|c| c.has_credentials()).count()
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_providers(providers)?);
        }
    }

    Ok(())
}
