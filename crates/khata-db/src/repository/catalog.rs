//! # Catalog Repository
//!
//! Database operations for catalog items.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Catalog Search Works                             │
//! │                                                                         │
//! │  User types: "écrou"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... ORDER BY name, id      (whole catalog)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  khata_core::catalog::search       (Unicode lowercase, substring)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Écrou Inox M8   ← MATCH                                               │
//! │  Steel Wire                                                            │
//! │                                                                         │
//! │  SQLite LIKE only folds ASCII case, so matching stays in Rust and      │
//! │  agrees with the in-memory lookup. Empty query → everything.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inserts and updates run `validate_catalog_item` first, so a negative
//! price or stock level comes back as `DbError::Invalid` naming the field.

use chrono::{DateTime, Utc};
use khata_core::validation::validate_catalog_item;
use khata_core::{catalog, CatalogItem, Money};
use sqlx::SqlitePool;
use tracing::debug;

use super::rate_from_column;
use crate::error::{DbError, DbResult};

const SELECT_ITEMS: &str = r#"
    SELECT
        id, name, hsn_code, barcode, unit, tax_rate_bps,
        selling_price_cents, mrp_cents, wholesale_price_cents,
        on_hand_qty, sold_qty, image_ref, created_at, updated_at
    FROM catalog_items
"#;

/// Raw `catalog_items` row.
#[derive(Debug, sqlx::FromRow)]
struct CatalogItemRow {
    id: String,
    name: String,
    hsn_code: Option<String>,
    barcode: Option<String>,
    unit: String,
    tax_rate_bps: i64,
    selling_price_cents: i64,
    mrp_cents: Option<i64>,
    wholesale_price_cents: Option<i64>,
    on_hand_qty: i64,
    sold_qty: i64,
    image_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(row: CatalogItemRow) -> Self {
        CatalogItem {
            id: row.id,
            name: row.name,
            hsn_code: row.hsn_code,
            barcode: row.barcode,
            unit: row.unit,
            tax_rate: rate_from_column(row.tax_rate_bps),
            selling_price: Money::from_minor(row.selling_price_cents),
            mrp: row.mrp_cents.map(Money::from_minor),
            wholesale_price: row.wholesale_price_cents.map(Money::from_minor),
            on_hand_qty: row.on_hand_qty,
            sold_qty: row.sold_qty,
            image_ref: row.image_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for catalog item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CatalogRepository::new(pool);
///
/// let results = repo.search("wire").await?;
/// let item = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Case-insensitive substring search over name, HSN code, barcode and unit.
    ///
    /// Results are ordered by name then id, so equal input gives equal output.
    pub async fn search(&self, query: &str) -> DbResult<Vec<CatalogItem>> {
        let query = query.trim();

        debug!(query = %query, "Searching catalog");

        let items = self.list_all().await?;
        if query.is_empty() {
            return Ok(items);
        }

        let found: Vec<CatalogItem> = catalog::search(&items, query).into_iter().cloned().collect();

        debug!(count = found.len(), scanned = items.len(), "Search returned items");
        Ok(found)
    }

    /// Lists the whole catalog ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<CatalogItem>> {
        let sql = format!("{SELECT_ITEMS} ORDER BY name, id");

        let rows = sqlx::query_as::<_, CatalogItemRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(CatalogItem))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        let sql = format!("{SELECT_ITEMS} WHERE id = ?1");

        let row = sqlx::query_as::<_, CatalogItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CatalogItem::from))
    }

    /// Inserts a new item.
    pub async fn insert(&self, item: &CatalogItem) -> DbResult<()> {
        validate_catalog_item(item)?;
        debug!(id = %item.id, name = %item.name, "Inserting catalog item");

        sqlx::query(
            r#"
            INSERT INTO catalog_items (
                id, name, hsn_code, barcode, unit, tax_rate_bps,
                selling_price_cents, mrp_cents, wholesale_price_cents,
                on_hand_qty, sold_qty, image_ref, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.hsn_code)
        .bind(&item.barcode)
        .bind(&item.unit)
        .bind(item.tax_rate.bps() as i64)
        .bind(item.selling_price.minor())
        .bind(item.mrp.map(|m| m.minor()))
        .bind(item.wholesale_price.map(|m| m.minor()))
        .bind(item.on_hand_qty)
        .bind(item.sold_qty)
        .bind(&item.image_ref)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing item.
    ///
    /// Stored documents are unaffected: their lines carry snapshots.
    pub async fn update(&self, item: &CatalogItem) -> DbResult<()> {
        validate_catalog_item(item)?;
        debug!(id = %item.id, "Updating catalog item");

        let result = sqlx::query(
            r#"
            UPDATE catalog_items SET
                name = ?2,
                hsn_code = ?3,
                barcode = ?4,
                unit = ?5,
                tax_rate_bps = ?6,
                selling_price_cents = ?7,
                mrp_cents = ?8,
                wholesale_price_cents = ?9,
                on_hand_qty = ?10,
                sold_qty = ?11,
                image_ref = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.hsn_code)
        .bind(&item.barcode)
        .bind(&item.unit)
        .bind(item.tax_rate.bps() as i64)
        .bind(item.selling_price.minor())
        .bind(item.mrp.map(|m| m.minor()))
        .bind(item.wholesale_price.map(|m| m.minor()))
        .bind(item.on_hand_qty)
        .bind(item.sold_qty)
        .bind(&item.image_ref)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CatalogItem", &item.id));
        }

        Ok(())
    }

    /// Counts catalog items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
