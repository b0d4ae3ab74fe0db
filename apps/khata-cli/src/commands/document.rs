//! `khata document ...`
//!
//! ```text
//! create:  --item specs ─► CatalogLookup ─► LineItemCart ─► compose ─► persist
//! derive:  quotation id ─► DocumentService::derive_invoice
//! print:   id ─► load + render (stored totals) ─► PrintSurface
//! repair:  find_orphans [─► repair_orphans]
//! ```

use chrono::{Days, NaiveDate};
use khata_core::validation::{coerce_amount, coerce_quantity, coerce_rate};
use khata_core::{
    compose, Adjustments, DateFields, DocumentHeader, DocumentKind, LineItemCart, PriceTier,
};
use serde::Serialize;
use tracing::{debug, info};

use super::{CreateArgs, DeriveArgs, DocumentArgs, DocumentCommand, PrintArgs};
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::print::{FileSurface, PrintSurface, WriterSurface};

pub async fn run(args: DocumentArgs, ctx: &Context) -> CliResult<()> {
    match args.command {
        DocumentCommand::Create(args) => {
            let header = create(ctx, args).await?;
            report_saved(ctx, "Saved", &header)
        }
        DocumentCommand::Derive(args) => {
            let header = derive(ctx, args).await?;
            report_saved(ctx, "Derived", &header)
        }
        DocumentCommand::Print(args) => print(ctx, args).await,
        DocumentCommand::List { kind } => {
            let headers = ctx.db.documents().list(kind).await?;
            report_headers(ctx, &headers, "No documents.")
        }
        DocumentCommand::Repair { delete } => {
            let headers = repair(ctx, delete).await?;
            let empty = if delete {
                "Nothing to remove."
            } else {
                "No documents without lines."
            };
            report_headers(ctx, &headers, empty)
        }
    }
}

// =============================================================================
// Item specs
// =============================================================================

/// One `--item ID[:QTY[:TIER]]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub item_id: String,
    pub quantity: i64,
    pub tier: PriceTier,
}

impl std::str::FromStr for ItemSpec {
    type Err = CliError;

    /// Quantity goes through the cart's coercion (missing or invalid is 1);
    /// an unknown tier is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let item_id = parts.next().unwrap_or_default().trim();
        if item_id.is_empty() {
            return Err(CliError::validation(format!("Invalid --item '{}': missing item id", s)));
        }

        let quantity = parts.next().map(coerce_quantity).unwrap_or(1);
        let tier = match parts.next() {
            Some(tier) if !tier.trim().is_empty() => tier
                .parse::<PriceTier>()
                .map_err(|e| CliError::validation(format!("Invalid --item '{}': {}", s, e)))?,
            _ => PriceTier::default(),
        };

        Ok(ItemSpec {
            item_id: item_id.to_string(),
            quantity,
            tier,
        })
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Builds a cart from the item specs, prices it and saves it.
pub async fn create(ctx: &Context, args: CreateArgs) -> CliResult<DocumentHeader> {
    let specs = args
        .items
        .iter()
        .map(|s| s.parse::<ItemSpec>())
        .collect::<CliResult<Vec<_>>>()?;

    let party = ctx
        .db
        .parties()
        .get_by_id(&args.party)
        .await?
        .ok_or_else(|| CliError::not_found("Party", &args.party))?;

    let lookup = ctx.lookup();
    let mut cart = LineItemCart::new();
    for spec in &specs {
        let item = lookup.get(&spec.item_id).await;
        let line = cart
            .add(item.as_ref(), spec.tier)
            .ok_or_else(|| CliError::lookup(format!("Catalog item not found: {}", spec.item_id)))?;
        cart.set_quantity(line, spec.quantity)?;
    }

    let documents = &ctx.config.documents;
    let adjustments = Adjustments {
        discount_percent: args.discount_percent.as_deref().map(coerce_rate).unwrap_or_default(),
        discount_amount: args.discount.as_deref().map(coerce_amount).unwrap_or_default(),
        tax_rate: args
            .tax_rate
            .as_deref()
            .map(coerce_rate)
            .unwrap_or_else(|| documents.tax_rate()),
        additional_charge: args.charge.as_deref().map(coerce_amount).unwrap_or_default(),
        round_off: args.round_off,
    };

    let issue_date = args.date.unwrap_or_else(|| ctx.today());
    let due_date = args.due.or_else(|| default_due(issue_date, documents.default_due_days));
    let dates = DateFields {
        issue_date,
        due_date,
    };
    let terms = args.terms.or_else(|| documents.default_terms.clone());

    debug!(
        kind = %args.kind,
        lines = cart.len(),
        subtotal = %cart.subtotal(),
        "Composing document"
    );

    let draft = compose(args.kind, Some(&party), dates, terms.as_deref(), &cart, adjustments)?;
    let header = ctx.documents().persist(&draft).await?;

    info!(number = %header.number, total = %header.totals.total, "Document created");
    Ok(header)
}

/// Invoice from a stored quotation.
pub async fn derive(ctx: &Context, args: DeriveArgs) -> CliResult<DocumentHeader> {
    let issue_date = args.date.unwrap_or_else(|| ctx.today());
    Ok(ctx.documents().derive_invoice(&args.source_id, issue_date).await?)
}

/// Loads, renders and hands the document to a print surface.
pub async fn print(ctx: &Context, args: PrintArgs) -> CliResult<()> {
    let rendered = ctx
        .documents()
        .render_document(&args.id, &ctx.config.business)
        .await?;

    match args.out {
        Some(path) => FileSurface::new(path, ctx.json).present(&rendered),
        None => WriterSurface::stdout(ctx.json).present(&rendered),
    }
}

/// Lists orphaned headers; with `delete`, removes them and returns what went.
pub async fn repair(ctx: &Context, delete: bool) -> CliResult<Vec<DocumentHeader>> {
    let service = ctx.documents();
    let headers = if delete {
        service.repair_orphans().await?
    } else {
        service.find_orphans().await?
    };
    Ok(headers)
}

fn default_due(issue_date: NaiveDate, days: Option<u32>) -> Option<NaiveDate> {
    days.and_then(|d| issue_date.checked_add_days(Days::new(u64::from(d))))
}

// =============================================================================
// Output
// =============================================================================

#[derive(Serialize)]
struct Saved<'a> {
    id: &'a str,
    kind: DocumentKind,
    number: &'a str,
    total: String,
}

fn report_saved(ctx: &Context, verb: &str, header: &DocumentHeader) -> CliResult<()> {
    if ctx.json {
        let body = serde_json::to_string_pretty(&Saved {
            id: &header.id,
            kind: header.kind,
            number: &header.number,
            total: header.totals.total.to_string(),
        })
        .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", body);
    } else {
        println!(
            "✓ {} {} {}  total {}{}  (id {})",
            verb,
            header.kind,
            header.number,
            ctx.config.business.currency_symbol,
            header.totals.total,
            header.id
        );
    }
    Ok(())
}

fn report_headers(ctx: &Context, headers: &[DocumentHeader], empty: &str) -> CliResult<()> {
    if ctx.json {
        let body = serde_json::to_string_pretty(headers)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", body);
        return Ok(());
    }

    if headers.is_empty() {
        println!("{}", empty);
        return Ok(());
    }

    for header in headers {
        println!(
            "{:<12} {:<10} {}  {:>12}  {}",
            header.number,
            header.kind,
            header.issue_date,
            header.totals.total,
            header.id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KhataConfig;
    use chrono::Utc;
    use khata_core::{Address, CatalogItem, Money, Party, PartyKind, Rate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded() -> Context {
        let mut config = KhataConfig::default();
        config.documents.default_terms = Some("Goods once sold will not be taken back.".to_string());
        config.documents.default_due_days = Some(30);
        let ctx = Context::in_memory(config).await;

        for (id, name, units) in [("wire", "Copper Wire", 100), ("plate", "Switch Plate", 50)] {
            ctx.db
                .catalog()
                .insert(&CatalogItem {
                    id: id.to_string(),
                    name: name.to_string(),
                    hsn_code: Some("8536".to_string()),
                    barcode: None,
                    unit: "pcs".to_string(),
                    tax_rate: Rate::from_bps(1800),
                    selling_price: Money::from_units(units),
                    mrp: Some(Money::from_units(units + 20)),
                    wholesale_price: None,
                    on_hand_qty: 10,
                    sold_qty: 0,
                    image_ref: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        ctx.db
            .parties()
            .insert(&Party {
                id: "ravi".to_string(),
                kind: PartyKind::Customer,
                name: "Ravi Kumar".to_string(),
                business_name: None,
                phone: None,
                email: None,
                billing_address: Address::default(),
                shipping_address: None,
                gstin: None,
                opening_balance: Money::zero(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        ctx
    }

    fn create_args(kind: DocumentKind, items: &[&str]) -> CreateArgs {
        CreateArgs {
            kind,
            party: "ravi".to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
            discount_percent: Some("10".to_string()),
            discount: None,
            tax_rate: None,
            charge: None,
            round_off: false,
            date: Some(date(2024, 4, 1)),
            due: None,
            terms: None,
        }
    }

    #[test]
    fn test_item_spec_parsing() {
        let spec: ItemSpec = "wire".parse().unwrap();
        assert_eq!(spec.quantity, 1);
        assert_eq!(spec.tier, PriceTier::Selling);

        let spec: ItemSpec = "wire:3:mrp".parse().unwrap();
        assert_eq!(spec.item_id, "wire");
        assert_eq!(spec.quantity, 3);
        assert_eq!(spec.tier, PriceTier::Mrp);

        let spec: ItemSpec = "wire:0".parse().unwrap();
        assert_eq!(spec.quantity, 1);

        assert!(":2".parse::<ItemSpec>().is_err());
        assert!("wire:2:retail".parse::<ItemSpec>().is_err());
        assert!("wire:2:gold".parse::<ItemSpec>().is_err());
    }

    #[tokio::test]
    async fn test_create_prices_and_saves() {
        let ctx = seeded().await;
        let header = create(&ctx, create_args(DocumentKind::Quotation, &["wire:2", "plate"]))
            .await
            .unwrap();

        assert_eq!(header.number, "QT-0001");
        assert_eq!(header.totals.subtotal.minor(), 25_000);
        assert_eq!(header.totals.discount.minor(), 2_500);
        assert_eq!(header.totals.tax_amount.minor(), 4_050);
        assert_eq!(header.totals.total.minor(), 26_550);
        assert_eq!(header.due_date, Some(date(2024, 5, 1)));
        assert_eq!(
            header.terms.as_deref(),
            Some("Goods once sold will not be taken back.")
        );
    }

    #[tokio::test]
    async fn test_create_with_tier_and_round_off() {
        let ctx = seeded().await;
        let mut args = create_args(DocumentKind::Invoice, &["plate:1:mrp"]);
        args.discount_percent = None;
        args.tax_rate = Some("0".to_string());
        args.charge = Some("4.60".to_string());
        args.round_off = true;

        let header = create(&ctx, args).await.unwrap();
        // 70.00 + 4.60 → 74.60 → 75.00
        assert_eq!(header.totals.total.minor(), 7_500);
    }

    #[tokio::test]
    async fn test_create_unknown_item_is_lookup_failure() {
        let ctx = seeded().await;
        let err = create(&ctx, create_args(DocumentKind::Invoice, &["cement"]))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::LookupFailure);
        assert!(ctx.db.documents().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_unknown_party() {
        let ctx = seeded().await;
        let mut args = create_args(DocumentKind::Invoice, &["wire"]);
        args.party = "nobody".to_string();
        let err = create(&ctx, args).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_derive_and_repair() {
        let ctx = seeded().await;
        let quote = create(&ctx, create_args(DocumentKind::Quotation, &["wire:2", "plate"]))
            .await
            .unwrap();

        let invoice = derive(
            &ctx,
            DeriveArgs {
                source_id: quote.id.clone(),
                date: Some(date(2024, 4, 5)),
            },
        )
        .await
        .unwrap();
        assert_eq!(invoice.number, "INV-0001");
        assert_eq!(invoice.totals, quote.totals);

        assert!(repair(&ctx, false).await.unwrap().is_empty());
        assert!(repair(&ctx, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_print_to_file() {
        let ctx = seeded().await;
        let header = create(&ctx, create_args(DocumentKind::Invoice, &["wire:2", "plate"]))
            .await
            .unwrap();

        let path = std::env::temp_dir().join(format!("khata-{}-{}.txt", header.number, std::process::id()));
        print(
            &ctx,
            PrintArgs {
                id: header.id.clone(),
                out: Some(path.clone()),
            },
        )
        .await
        .unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(body.contains("TAX INVOICE"));
        assert!(body.contains("INV-0001"));
        assert!(body.contains("₹265.50"));
        assert!(body.contains("Terms & Conditions"));
    }

    #[test]
    fn test_default_due() {
        assert_eq!(default_due(date(2024, 1, 31), Some(30)), Some(date(2024, 3, 1)));
        assert_eq!(default_due(date(2024, 1, 31), None), None);
    }
}
