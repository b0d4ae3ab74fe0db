//! CLI command implementations.

pub mod catalog;
pub mod config;
pub mod document;

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use khata_core::DocumentKind;
use std::path::PathBuf;

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Search items by name, HSN code, barcode or unit.
    Search {
        /// Text to look for. Omit to list everything.
        #[arg(default_value = "")]
        query: String,
    },
}

/// Arguments for the document command.
#[derive(Args)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub command: DocumentCommand,
}

#[derive(Subcommand)]
pub enum DocumentCommand {
    /// Price a cart and save it as a quotation or invoice.
    Create(CreateArgs),

    /// Create an invoice from a stored quotation.
    Derive(DeriveArgs),

    /// Render a stored document.
    Print(PrintArgs),

    /// List stored documents.
    List {
        /// Only this kind (quotation or invoice).
        #[arg(short, long)]
        kind: Option<DocumentKind>,
    },

    /// List documents saved without lines, optionally deleting them.
    Repair {
        /// Delete the orphaned headers.
        #[arg(long)]
        delete: bool,
    },
}

/// Arguments for `document create`.
#[derive(Args)]
pub struct CreateArgs {
    /// quotation or invoice.
    #[arg(short, long, default_value = "quotation")]
    pub kind: DocumentKind,

    /// Party id.
    #[arg(short, long)]
    pub party: String,

    /// Line as ITEM_ID[:QTY[:TIER]], TIER one of selling, mrp, wholesale.
    #[arg(short, long = "item", required = true)]
    pub items: Vec<String>,

    /// Discount percent. Takes priority over --discount.
    #[arg(long)]
    pub discount_percent: Option<String>,

    /// Flat discount amount.
    #[arg(long)]
    pub discount: Option<String>,

    /// Tax rate percent. Defaults to the configured rate.
    #[arg(long)]
    pub tax_rate: Option<String>,

    /// Additional charge added after tax.
    #[arg(long)]
    pub charge: Option<String>,

    /// Round the total to the nearest whole unit.
    #[arg(long)]
    pub round_off: bool,

    /// Issue date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Terms printed at the foot of the document.
    #[arg(long)]
    pub terms: Option<String>,
}

/// Arguments for `document derive`.
#[derive(Args)]
pub struct DeriveArgs {
    /// Id of the quotation to copy.
    pub source_id: String,

    /// Issue date of the invoice (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for `document print`.
#[derive(Args)]
pub struct PrintArgs {
    /// Document id.
    pub id: String,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration.
    Show,

    /// Write the effective configuration to khata.toml.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
