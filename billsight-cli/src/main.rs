// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `BillSight` CLI - bill and receipt expense extraction from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Process a receipt with the configured models
//! billsight process receipt.jpg
//!
//! # Force a primary model and skip the fallback
//! billsight process receipt.jpg --primary openrouter_qwen --no-fallback
//!
//! # JSON output
//! billsight --format json --pretty process receipt.jpg
//!
//! # Which providers have credentials
//! billsight check
//!
//! # Stored bills
//! billsight list --limit 5
//! billsight show 12
//! billsight export 12 --output bill-12.csv
//! billsight stats
//! ```

mod commands;
mod output;

use anyhow::Result;
use billsight_store::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{bills, check, config, process, providers};

// ============================================================================
// CLI Definition
// ============================================================================

/// `BillSight` CLI - bill and receipt expense extraction.
#[derive(Parser)]
#[command(name = "billsight")]
#[command(about = "Extract expenses from bill and receipt images with vision models")]
#[command(long_about = r#"
BillSight reads a bill or receipt image with a vision-language model,
categorizes every line item, summarizes the spending and stores the result
in a local SQLite database.

Models:
  • openrouter_gemini        (primary, OPENROUTER_API_KEY)
  • groq_llama_scout         (fallback, GROQ_API_KEY)
  • openrouter_llama_vision
  • openrouter_qwen

API keys are read from the environment or from a .env file in the
current directory.

Examples:
  billsight process receipt.jpg       # Extract, summarize, store
  billsight check                     # Which providers are configured
  billsight list                      # Recently stored bills
  billsight export 3 -o bill.csv      # Line items as CSV
"#)]
#[command(version)]
#[command(author = "BillSight Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug logs).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logs, errors only).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Extract, summarize and store one bill image.
    #[command(visible_alias = "p")]
    Process(process::ProcessArgs),

    /// List registered model providers.
    Providers,

    /// Check credentials, settings and the database.
    Check(check::CheckArgs),

    /// Show one stored bill with its line items.
    Show(bills::ShowArgs),

    /// List recently stored bills.
    #[command(visible_alias = "ls")]
    List(bills::ListArgs),

    /// Show totals over all stored bills.
    Stats,

    /// Export the line items of a stored bill as CSV.
    Export(bills::ExportArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Any failure other than a quality rejection.
    Error = 1,
    /// The image was readable but scored below the minimum confidence.
    QualityRejected = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Picks the filter directive: `--verbose`, then `RUST_LOG`, then the
/// configured level.
fn log_directive(verbose: bool, env: Option<&str>, configured: LogLevel) -> String {
    if verbose {
        return "billsight=debug,info".to_string();
    }
    match env.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directive) => directive.to_string(),
        None => format!("billsight={configured}"),
    }
}

fn setup_logging(verbose: bool, quiet: bool, configured: LogLevel) {
    if quiet {
        return;
    }

    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = log_directive(verbose, env.as_deref(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("billsight=warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    // A missing .env file is normal; keys may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let configured = commands::load_settings().await.log_level;
    setup_logging(cli.verbose, cli.quiet, configured);

    let result: Result<ExitCode> = match &cli.command {
        Commands::Process(args) => process::run(args, &cli).await,
        Commands::Providers => providers::run(&cli).map(|()| ExitCode::Success),
        Commands::Check(args) => check::run(args, &cli).await,
        Commands::Show(args) => bills::show(args, &cli).await.map(|()| ExitCode::Success),
        Commands::List(args) => bills::list(args, &cli).await.map(|()| ExitCode::Success),
        Commands::Stats => bills::stats(&cli).await.map(|()| ExitCode::Success),
        Commands::Export(args) => bills::export(args, &cli).await.map(|()| ExitCode::Success),
        Commands::Config(args) => config::run(args, &cli).await.map(|()| ExitCode::Success),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::Error
        }
    };

    if code != ExitCode::Success {
        std::process::exit(code as i32);
    }
}
