//! `khata catalog ...`

use khata_core::CatalogItem;
use tracing::debug;

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::error::{CliError, CliResult};

pub async fn run(args: CatalogArgs, ctx: &Context) -> CliResult<()> {
    match args.command {
        CatalogCommand::Search { query } => {
            let items = search(ctx, &query).await;
            if ctx.json {
                let body = serde_json::to_string_pretty(&items)
                    .map_err(|e| CliError::internal(e.to_string()))?;
                println!("{}", body);
            } else if items.is_empty() {
                println!("No items found.");
            } else {
                for line in format_items(&items, &ctx.config.business.currency_symbol) {
                    println!("{}", line);
                }
            }
            Ok(())
        }
    }
}

/// Runs a lookup. Store failures come back as an empty list.
pub async fn search(ctx: &Context, query: &str) -> Vec<CatalogItem> {
    let items = ctx.lookup().search(query).await;
    debug!(query = %query, count = items.len(), "Catalog search");
    items
}

fn format_items(items: &[CatalogItem], symbol: &str) -> Vec<String> {
    let mut out = vec![format!(
        "{:<36}  {:<30} {:<8} {:>5} {:>12} {:>7}",
        "ID", "Name", "HSN", "Unit", "Price", "Stock"
    )];
    out.extend(items.iter().map(|item| {
        format!(
            "{:<36}  {:<30} {:<8} {:>5} {:>12} {:>7}",
            item.id,
            item.name,
            item.hsn_code.as_deref().unwrap_or("-"),
            item.unit,
            format!("{}{}", symbol, item.selling_price),
            item.on_hand_qty
        )
    }));
    out
}
