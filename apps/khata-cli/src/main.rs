//! # Khata CLI
//!
//! Quotations and invoices for a small business, from the command line.
//!
//! Commands:
//! - `khata catalog search [QUERY]` - Find catalog items
//! - `khata document create ...` - Price a cart and save a quotation or invoice
//! - `khata document derive ID` - Invoice from a stored quotation
//! - `khata document print ID` - Render a stored document
//! - `khata document list` - List stored documents
//! - `khata document repair` - Find (and delete) documents saved without lines
//! - `khata config show|init` - Inspect or write khata.toml
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                             │
//! │  2. Initialize logging (stderr, RUST_LOG or default filter)            │
//! │  3. Load config: defaults → khata.toml → KHATA_* env → validate        │
//! │  4. Open database (WAL, migrations)                                    │
//! │  5. Run command; on error print it and exit with the code's status     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod config;
mod context;
mod error;
mod print;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::{CatalogArgs, ConfigArgs, DocumentArgs};
use config::KhataConfig;
use context::Context;
use error::{CliError, CliResult};

/// Khata - quotations and invoices for small businesses
#[derive(Parser)]
#[command(name = "khata")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up catalog items
    Catalog(CatalogArgs),

    /// Create, derive, print and repair documents
    Document(DocumentArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    let json = cli.json;
    if let Err(e) = run(cli).await {
        report_error(&e, json);
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = KhataConfig::load(cli.config.clone())?;
    debug!(business = %config.business.name, "Configuration loaded");

    match cli.command {
        Commands::Config(args) => commands::config::run(args, &config, cli.config, cli.json),
        Commands::Catalog(args) => {
            let ctx = Context::open(config, cli.db, cli.json).await?;
            commands::catalog::run(args, &ctx).await
        }
        Commands::Document(args) => {
            let ctx = Context::open(config, cli.db, cli.json).await?;
            let result = commands::document::run(args, &ctx).await;
            ctx.db.close().await;
            result
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=khata_db=trace` - Trace the database crate only
/// - Default: `info,khata=debug,sqlx=warn`; `--verbose` raises it to `debug`
fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose {
        "debug,sqlx=warn"
    } else {
        "info,khata=debug,sqlx=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

fn report_error(err: &CliError, json: bool) {
    if json {
        match serde_json::to_string(err) {
            Ok(body) => eprintln!("{}", body),
            Err(_) => eprintln!("{}", err),
        }
    } else {
        eprintln!("✗ {}", err.message);
    }
}
