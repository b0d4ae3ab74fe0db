//! # Document Repository
//!
//! Quotation / invoice headers and their lines.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Document Writes                                      │
//! │                                                                         │
//! │  insert_header(draft)                                                  │
//! │  └── TX 1: bump document_sequences → format number → INSERT header     │
//! │                                                                         │
//! │  insert_lines(id, lines)                                               │
//! │  └── TX 2: INSERT every line (all or nothing)                          │
//! │                                                                         │
//! │  TX 1 ok + TX 2 failed  ⇒  header with zero lines ("orphan")           │
//! │                            find_orphans() lists them                   │
//! │                                                                         │
//! │  replace(id, draft)                                                    │
//! │  └── one TX: UPDATE header → DELETE lines → INSERT lines               │
//! │      id, kind, number and sequence are never touched                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use khata_core::{
    Adjustments, DocumentAggregate, DocumentDraft, DocumentHeader, DocumentKind, DocumentLine,
    ItemSnapshot, Money, NumberingScheme, PriceTier, PricingBreakdown,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, rate_from_column};
use crate::error::{DbError, DbResult};

const SELECT_HEADERS: &str = r#"
    SELECT
        id, kind, number, sequence, issue_date, due_date, party_id, terms,
        discount_percent_bps, discount_amount_cents, tax_rate_bps,
        additional_charge_cents, round_off,
        subtotal_cents, discount_cents, taxable_cents, tax_amount_cents, total_cents,
        source_document_id, created_at, updated_at
    FROM documents
"#;

const SELECT_LINES: &str = r#"
    SELECT
        id, position, item_id, name, unit, hsn_code, tax_rate_bps,
        selling_price_cents, mrp_cents, wholesale_price_cents,
        tier, unit_price_cents, quantity, line_total_cents
    FROM document_lines
"#;

// =============================================================================
// Row Records
// =============================================================================

/// Raw `documents` row.
#[derive(Debug, sqlx::FromRow)]
struct HeaderRow {
    id: String,
    kind: DocumentKind,
    number: String,
    sequence: i64,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    party_id: String,
    terms: Option<String>,
    discount_percent_bps: i64,
    discount_amount_cents: i64,
    tax_rate_bps: i64,
    additional_charge_cents: i64,
    round_off: bool,
    subtotal_cents: i64,
    discount_cents: i64,
    taxable_cents: i64,
    tax_amount_cents: i64,
    total_cents: i64,
    source_document_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<HeaderRow> for DocumentHeader {
    fn from(row: HeaderRow) -> Self {
        let adjustments = Adjustments {
            discount_percent: rate_from_column(row.discount_percent_bps),
            discount_amount: Money::from_minor(row.discount_amount_cents),
            tax_rate: rate_from_column(row.tax_rate_bps),
            additional_charge: Money::from_minor(row.additional_charge_cents),
            round_off: row.round_off,
        };

        DocumentHeader {
            id: row.id,
            kind: row.kind,
            number: row.number,
            sequence: row.sequence,
            issue_date: row.issue_date,
            due_date: row.due_date,
            party_id: row.party_id,
            terms: row.terms,
            totals: PricingBreakdown {
                subtotal: Money::from_minor(row.subtotal_cents),
                discount: Money::from_minor(row.discount_cents),
                taxable_amount: Money::from_minor(row.taxable_cents),
                tax_rate: adjustments.tax_rate,
                tax_amount: Money::from_minor(row.tax_amount_cents),
                additional_charge: adjustments.additional_charge.non_negative(),
                total: Money::from_minor(row.total_cents),
                round_off: adjustments.round_off,
            },
            adjustments,
            source_document_id: row.source_document_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Raw `document_lines` row.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    position: i64,
    item_id: String,
    name: String,
    unit: String,
    hsn_code: Option<String>,
    tax_rate_bps: i64,
    selling_price_cents: i64,
    mrp_cents: Option<i64>,
    wholesale_price_cents: Option<i64>,
    tier: PriceTier,
    unit_price_cents: i64,
    quantity: i64,
    line_total_cents: i64,
}

impl From<LineRow> for DocumentLine {
    fn from(row: LineRow) -> Self {
        DocumentLine {
            id: row.id,
            position: row.position.clamp(0, u32::MAX as i64) as u32,
            item: ItemSnapshot {
                item_id: row.item_id,
                name: row.name,
                unit: row.unit,
                hsn_code: row.hsn_code,
                tax_rate: rate_from_column(row.tax_rate_bps),
                selling_price: Money::from_minor(row.selling_price_cents),
                mrp: row.mrp_cents.map(Money::from_minor),
                wholesale_price: row.wholesale_price_cents.map(Money::from_minor),
            },
            tier: row.tier,
            unit_price: Money::from_minor(row.unit_price_cents),
            quantity: row.quantity,
            line_total: Money::from_minor(row.line_total_cents),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for document headers and lines.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Allocates the next number for `draft.kind` and inserts the header.
    ///
    /// Sequence allocation and header insert share one transaction, so a
    /// failed insert does not burn a number.
    pub async fn insert_header(
        &self,
        draft: &DocumentDraft,
        scheme: &NumberingScheme,
    ) -> DbResult<DocumentHeader> {
        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_sequences (kind, last_value) VALUES (?1, 1)
            ON CONFLICT (kind) DO UPDATE SET last_value = last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(draft.kind)
        .fetch_one(&mut *tx)
        .await?;

        let now = Utc::now();
        let header = DocumentHeader {
            id: generate_id(),
            kind: draft.kind,
            number: scheme.format(draft.kind, sequence),
            sequence,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            party_id: draft.party_id.clone(),
            terms: draft.terms.clone(),
            adjustments: draft.adjustments,
            totals: draft.totals,
            source_document_id: draft.source_document_id.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %header.id,
            kind = %header.kind,
            number = %header.number,
            "Inserting document header"
        );

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, kind, number, sequence, issue_date, due_date, party_id, terms,
                discount_percent_bps, discount_amount_cents, tax_rate_bps,
                additional_charge_cents, round_off,
                subtotal_cents, discount_cents, taxable_cents, tax_amount_cents, total_cents,
                source_document_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13,
                ?14, ?15, ?16, ?17, ?18,
                ?19, ?20, ?21
            )
            "#,
        )
        .bind(&header.id)
        .bind(header.kind)
        .bind(&header.number)
        .bind(header.sequence)
        .bind(header.issue_date)
        .bind(header.due_date)
        .bind(&header.party_id)
        .bind(&header.terms)
        .bind(header.adjustments.discount_percent.bps() as i64)
        .bind(header.adjustments.discount_amount.minor())
        .bind(header.adjustments.tax_rate.bps() as i64)
        .bind(header.adjustments.additional_charge.minor())
        .bind(header.adjustments.round_off)
        .bind(header.totals.subtotal.minor())
        .bind(header.totals.discount.minor())
        .bind(header.totals.taxable_amount.minor())
        .bind(header.totals.tax_amount.minor())
        .bind(header.totals.total.minor())
        .bind(&header.source_document_id)
        .bind(header.created_at)
        .bind(header.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(header)
    }

    /// Inserts all lines of a document in one transaction.
    pub async fn insert_lines(&self, document_id: &str, lines: &[DocumentLine]) -> DbResult<()> {
        debug!(document_id = %document_id, count = lines.len(), "Inserting document lines");

        let mut tx = self.pool.begin().await?;
        for line in lines {
            insert_line(&mut tx, document_id, line).await?;
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Rewrites header fields and the full line set in one transaction.
    ///
    /// Identity (id, kind, number, sequence) and `created_at` are kept.
    pub async fn replace(&self, id: &str, draft: &DocumentDraft) -> DbResult<DocumentHeader> {
        debug!(id = %id, lines = draft.lines.len(), "Replacing document");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE documents SET
                issue_date = ?2,
                due_date = ?3,
                party_id = ?4,
                terms = ?5,
                discount_percent_bps = ?6,
                discount_amount_cents = ?7,
                tax_rate_bps = ?8,
                additional_charge_cents = ?9,
                round_off = ?10,
                subtotal_cents = ?11,
                discount_cents = ?12,
                taxable_cents = ?13,
                tax_amount_cents = ?14,
                total_cents = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(draft.issue_date)
        .bind(draft.due_date)
        .bind(&draft.party_id)
        .bind(&draft.terms)
        .bind(draft.adjustments.discount_percent.bps() as i64)
        .bind(draft.adjustments.discount_amount.minor())
        .bind(draft.adjustments.tax_rate.bps() as i64)
        .bind(draft.adjustments.additional_charge.minor())
        .bind(draft.adjustments.round_off)
        .bind(draft.totals.subtotal.minor())
        .bind(draft.totals.discount.minor())
        .bind(draft.totals.taxable_amount.minor())
        .bind(draft.totals.tax_amount.minor())
        .bind(draft.totals.total.minor())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }

        sqlx::query("DELETE FROM document_lines WHERE document_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for line in &draft.lines {
            insert_line(&mut tx, id, line).await?;
        }

        let sql = format!("{SELECT_HEADERS} WHERE id = ?1");
        let row = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(row.into())
    }

    /// Gets a header by id.
    pub async fn get_header(&self, id: &str) -> DbResult<Option<DocumentHeader>> {
        let sql = format!("{SELECT_HEADERS} WHERE id = ?1");

        let row = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(DocumentHeader::from))
    }

    /// Gets a header by its display number.
    pub async fn get_by_number(
        &self,
        kind: DocumentKind,
        number: &str,
    ) -> DbResult<Option<DocumentHeader>> {
        let sql = format!("{SELECT_HEADERS} WHERE kind = ?1 AND number = ?2");

        let row = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(kind)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(DocumentHeader::from))
    }

    /// Lines of a document in display order.
    pub async fn get_lines(&self, document_id: &str) -> DbResult<Vec<DocumentLine>> {
        let sql = format!("{SELECT_LINES} WHERE document_id = ?1 ORDER BY position");

        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(DocumentLine::from).collect())
    }

    /// Header plus lines.
    pub async fn get(&self, id: &str) -> DbResult<Option<DocumentAggregate>> {
        let Some(header) = self.get_header(id).await? else {
            return Ok(None);
        };
        let lines = self.get_lines(id).await?;
        Ok(Some(DocumentAggregate { header, lines }))
    }

    /// Lists headers, newest first, optionally filtered by kind.
    pub async fn list(&self, kind: Option<DocumentKind>) -> DbResult<Vec<DocumentHeader>> {
        let rows = match kind {
            Some(kind) => {
                let sql = format!("{SELECT_HEADERS} WHERE kind = ?1 ORDER BY sequence DESC");
                sqlx::query_as::<_, HeaderRow>(&sql)
                    .bind(kind)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{SELECT_HEADERS} ORDER BY created_at DESC, number");
                sqlx::query_as::<_, HeaderRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(DocumentHeader::from).collect())
    }

    /// Counts the lines stored for a document.
    pub async fn count_lines(&self, document_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM document_lines WHERE document_id = ?1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Headers that have no lines.
    pub async fn find_orphans(&self) -> DbResult<Vec<DocumentHeader>> {
        let sql = format!(
            r#"{SELECT_HEADERS}
            WHERE NOT EXISTS (
                SELECT 1 FROM document_lines l WHERE l.document_id = documents.id
            )
            ORDER BY created_at
            "#
        );

        let rows = sqlx::query_as::<_, HeaderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(DocumentHeader::from).collect())
    }

    /// Deletes a document; its lines cascade.
    ///
    /// Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id = %id, "Deleted document");
        }
        Ok(deleted)
    }
}

/// Inserts one line on an open connection (normally a transaction).
async fn insert_line(
    conn: &mut SqliteConnection,
    document_id: &str,
    line: &DocumentLine,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO document_lines (
            id, document_id, position,
            item_id, name, unit, hsn_code, tax_rate_bps,
            selling_price_cents, mrp_cents, wholesale_price_cents,
            tier, unit_price_cents, quantity, line_total_cents
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11,
            ?12, ?13, ?14, ?15
        )
        "#,
    )
    .bind(&line.id)
    .bind(document_id)
    .bind(line.position as i64)
    .bind(&line.item.item_id)
    .bind(&line.item.name)
    .bind(&line.item.unit)
    .bind(&line.item.hsn_code)
    .bind(line.item.tax_rate.bps() as i64)
    .bind(line.item.selling_price.minor())
    .bind(line.item.mrp.map(|m| m.minor()))
    .bind(line.item.wholesale_price.map(|m| m.minor()))
    .bind(line.tier)
    .bind(line.unit_price.minor())
    .bind(line.quantity)
    .bind(line.line_total.minor())
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use khata_core::{compose, Address, CatalogItem, DateFields, LineItemCart, Party, PartyKind, Rate};

    fn item(id: &str, units: i64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            hsn_code: Some("8536".to_string()),
            barcode: None,
            unit: "pcs".to_string(),
            tax_rate: Rate::from_bps(1800),
            selling_price: Money::from_units(units),
            mrp: Some(Money::from_units(units + 5)),
            wholesale_price: None,
            on_hand_qty: 10,
            sold_qty: 0,
            image_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn party() -> Party {
        Party {
            id: "party-1".to_string(),
            kind: PartyKind::Customer,
            name: "Sunita".to_string(),
            business_name: None,
            phone: None,
            email: None,
            billing_address: Address::default(),
            shipping_address: None,
            gstin: None,
            opening_balance: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn draft(kind: DocumentKind) -> DocumentDraft {
        let mut cart = LineItemCart::new();
        let a = cart.add(Some(&item("a", 100)), PriceTier::Selling).unwrap();
        cart.add(Some(&item("b", 50)), PriceTier::Mrp);
        cart.set_quantity(a, 2).unwrap();

        compose(
            kind,
            Some(&party()),
            DateFields::issued(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
            Some("Net 30"),
            &cart,
            Adjustments {
                discount_percent: Rate::from_bps(1000),
                tax_rate: Rate::from_bps(1800),
                round_off: true,
                ..Adjustments::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_numbers_are_sequential_per_kind() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        let scheme = NumberingScheme::default();

        let q1 = repo.insert_header(&draft(DocumentKind::Quotation), &scheme).await.unwrap();
        let i1 = repo.insert_header(&draft(DocumentKind::Invoice), &scheme).await.unwrap();
        let q2 = repo.insert_header(&draft(DocumentKind::Quotation), &scheme).await.unwrap();

        assert_eq!(q1.number, "QT-0001");
        assert_eq!(q2.number, "QT-0002");
        assert_eq!(i1.number, "INV-0001");
        assert_eq!(q2.sequence, 2);
    }

    #[tokio::test]
    async fn test_header_and_lines_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        let draft = draft(DocumentKind::Invoice);

        let header = repo.insert_header(&draft, &NumberingScheme::default()).await.unwrap();
        repo.insert_lines(&header.id, &draft.lines).await.unwrap();

        let loaded = repo.get(&header.id).await.unwrap().unwrap();
        assert_eq!(loaded.header.id, header.id);
        assert_eq!(loaded.header.number, "INV-0001");
        assert_eq!(loaded.header.issue_date, draft.issue_date);
        assert_eq!(loaded.header.totals, draft.totals);
        assert_eq!(loaded.header.adjustments, draft.adjustments);
        assert_eq!(loaded.header.terms.as_deref(), Some("Net 30"));
        assert_eq!(loaded.lines, draft.lines);
        assert_eq!(repo.count_lines(&header.id).await.unwrap(), 2);

        let by_number = repo
            .get_by_number(DocumentKind::Invoice, &header.number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, header.id);
    }

    #[tokio::test]
    async fn test_duplicate_line_rolls_back_whole_batch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        let draft = draft(DocumentKind::Invoice);
        let header = repo.insert_header(&draft, &NumberingScheme::default()).await.unwrap();

        let mut lines = draft.lines.clone();
        lines[1].position = lines[0].position;

        let err = repo.insert_lines(&header.id, &lines).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.count_lines(&header.id).await.unwrap(), 0);

        let orphans = repo.find_orphans().await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, header.id);
    }

    #[tokio::test]
    async fn test_lines_need_existing_header() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let draft = draft(DocumentKind::Invoice);
        let err = db.documents().insert_lines("ghost", &draft.lines).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_replace_keeps_identity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        let original = draft(DocumentKind::Quotation);
        let header = repo.insert_header(&original, &NumberingScheme::default()).await.unwrap();
        repo.insert_lines(&header.id, &original.lines).await.unwrap();

        let mut cart = LineItemCart::new();
        cart.add(Some(&item("c", 75)), PriceTier::Selling);
        let edited = compose(
            DocumentKind::Quotation,
            Some(&party()),
            DateFields::issued(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()),
            None,
            &cart,
            Adjustments::default(),
        )
        .unwrap();

        let updated = repo.replace(&header.id, &edited).await.unwrap();
        assert_eq!(updated.id, header.id);
        assert_eq!(updated.number, header.number);
        assert_eq!(updated.sequence, header.sequence);
        assert_eq!(updated.totals.total.minor(), 7_500);
        assert!(updated.terms.is_none());

        let lines = repo.get_lines(&header.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.item_id, "c");

        assert!(matches!(
            repo.replace("ghost", &edited).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        let draft = draft(DocumentKind::Invoice);
        let header = repo.insert_header(&draft, &NumberingScheme::default()).await.unwrap();
        repo.insert_lines(&header.id, &draft.lines).await.unwrap();

        assert!(repo.delete(&header.id).await.unwrap());
        assert!(!repo.delete(&header.id).await.unwrap());
        assert_eq!(repo.count_lines(&header.id).await.unwrap(), 0);
        assert!(repo.get(&header.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_kind() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.documents();
        let scheme = NumberingScheme::default();
        repo.insert_header(&draft(DocumentKind::Quotation), &scheme).await.unwrap();
        repo.insert_header(&draft(DocumentKind::Invoice), &scheme).await.unwrap();
        repo.insert_header(&draft(DocumentKind::Invoice), &scheme).await.unwrap();

        let invoices = repo.list(Some(DocumentKind::Invoice)).await.unwrap();
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].number, "INV-0002");
        assert_eq!(repo.list(None).await.unwrap().len(), 3);
    }
}
