//! Commands over stored bills: show, list, stats and export.

use anyhow::{Context, Result};
use billsight_core::{LineItem, line_items_to_csv};
use billsight_store::StoreError;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{load_settings, open_store};
use crate::output::{BillDetailOutput, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Bill id.
    pub id: i64,
}

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Maximum number of bills to show.
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,
}

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Bill id.
    pub id: i64,

    /// Write the CSV to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Shows one bill with its line items.
pub async fn show(args: &ShowArgs, cli: &Cli) -> Result<()> {
    let store = open_store(&load_settings().await).await?;
    let bill = store.get_bill(args.id).map_err(not_found_hint)?;
    let items = store.get_line_items(args.id)?;
    let detail = BillDetailOutput { bill, items };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_bill(&detail));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&detail)?);
        }
    }

    Ok(())
}

/// Lists the most recent bills.
pub async fn list(args: &ListArgs, cli: &Cli) -> Result<()> {
    let store = open_store(&load_settings().await).await?;
    let bills = store.list_bills(args.limit)?;
    info!(count = bills.len(), "Listing bills");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_bill_list(&bills));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&bills)?);
        }
    }

    Ok(())
}

/// Shows aggregate spending over all stored bills.
pub async fn stats(cli: &Cli) -> Result<()> {
    let store = open_store(&load_settings().await).await?;
    let stats = store.statistics()?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_stats(&stats));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&stats)?);
        }
    }

    Ok(())
}

/// Exports the line items of one bill as CSV.
pub async fn export(args: &ExportArgs, _cli: &Cli) -> Result<()> {
    let store = open_store(&load_settings().await).await?;
    // Fail on a missing bill rather than exporting an empty file.
    store.get_bill(args.id).map_err(not_found_hint)?;

    let items: Vec<LineItem> = store
        .get_line_items(args.id)?
        .iter()
        .map(|row| row.to_line_item())
        .collect();
    let csv = line_items_to_csv(&items)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, csv)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), items = items.len(), "Exported line items");
            eprintln!("Exported {} items to {}", items.len(), path.display());
        }
        None => print!("{csv}"),
    }

    Ok(())
}

fn not_found_hint(e: StoreError) -> anyhow::Error {
    match e {
        StoreError::BillNotFound(id) => {
            anyhow::anyhow!("No bill with id {id}. Run `billsight list` to see stored bills.")
        }
        other => other.into(),
    }
}
