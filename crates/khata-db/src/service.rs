//! # Document Service
//!
//! The persist / load / edit / repair boundary on top of the store traits.
//!
//! ## Persist
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    persist(draft)                                       │
//! │                                                                         │
//! │  validate draft ──✗──► ServiceError::Validation (nothing written)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert_header ──✗──► ServiceError::Store (nothing written)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert_lines ──✗──► ServiceError::PartialWrite { document_id, .. }    │
//! │       │                header stays, zero lines                        │
//! │       ▼                  ├── retry_lines(id, draft)                    │
//! │  Ok(header)              └── repair_orphans()                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use khata_core::validation::validate_search_query;
use khata_core::{
    derive_from, render::render_aggregate, BusinessProfile, CatalogItem, CoreError,
    DocumentAggregate, DocumentDraft, DocumentHeader, DocumentKind, NumberingScheme, Party,
    RenderedDocument, ValidationError,
};
use tracing::{debug, error, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{CatalogStore, DocumentStore, PartyStore};

// =============================================================================
// Document Service
// =============================================================================

/// Owns document persistence for one store.
///
/// ## Usage
/// ```rust,ignore
/// let service = DocumentService::new(db.clone(), NumberingScheme::default());
/// let header = service.persist(&draft).await?;
/// let doc = service.load_document(&header.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentService<S> {
    store: S,
    scheme: NumberingScheme,
}

impl<S> DocumentService<S>
where
    S: DocumentStore + PartyStore,
{
    pub fn new(store: S, scheme: NumberingScheme) -> Self {
        DocumentService { store, scheme }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheme(&self) -> &NumberingScheme {
        &self.scheme
    }

    /// Writes a draft: header first, then all lines.
    ///
    /// ## Returns
    /// * `Ok(DocumentHeader)` - header and every line were written
    /// * `Err(ServiceError::PartialWrite)` - header written, lines not
    /// * any other error - nothing was written
    pub async fn persist(&self, draft: &DocumentDraft) -> ServiceResult<DocumentHeader> {
        validate_draft(draft)?;

        let header = self.store.insert_header(draft, &self.scheme).await?;

        if let Err(source) = self.store.insert_lines(&header.id, &draft.lines).await {
            error!(
                document_id = %header.id,
                number = %header.number,
                error = %source,
                "Document header saved but lines failed"
            );
            return Err(ServiceError::PartialWrite {
                document_id: header.id,
                number: header.number,
                source,
            });
        }

        info!(
            document_id = %header.id,
            number = %header.number,
            lines = draft.lines.len(),
            total = %header.totals.total,
            "Document saved"
        );

        Ok(header)
    }

    /// Loads a header with its lines in position order.
    pub async fn load_document(&self, id: &str) -> ServiceResult<DocumentAggregate> {
        let header = self
            .store
            .get_header(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document", id))?;
        let lines = self.store.get_lines(id).await?;

        debug!(document_id = %id, lines = lines.len(), "Loaded document");
        Ok(DocumentAggregate { header, lines })
    }

    /// Edit mode save: replaces header fields and the full line set.
    ///
    /// The draft must be of the same kind as the stored document.
    pub async fn replace(&self, id: &str, draft: &DocumentDraft) -> ServiceResult<DocumentHeader> {
        validate_draft(draft)?;

        let existing = self
            .store
            .get_header(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document", id))?;

        if existing.kind != draft.kind {
            return Err(CoreError::DocumentKindMismatch {
                document_id: id.to_string(),
                expected: draft.kind,
                actual: existing.kind,
            }
            .into());
        }

        let header = self.store.replace_document(id, draft).await?;
        info!(
            document_id = %header.id,
            number = %header.number,
            lines = draft.lines.len(),
            "Document replaced"
        );
        Ok(header)
    }

    /// Creates and saves an invoice from a stored quotation.
    pub async fn derive_invoice(
        &self,
        source_id: &str,
        issue_date: NaiveDate,
    ) -> ServiceResult<DocumentHeader> {
        let source = self.load_document(source_id).await?;

        if source.header.kind != DocumentKind::Quotation {
            return Err(CoreError::DocumentKindMismatch {
                document_id: source_id.to_string(),
                expected: DocumentKind::Quotation,
                actual: source.header.kind,
            }
            .into());
        }

        let party = self.store.get_party(&source.header.party_id).await?;
        let draft = derive_from(&source, DocumentKind::Invoice, party.as_ref(), issue_date)?;

        debug!(
            source = %source.header.number,
            lines = draft.lines.len(),
            "Deriving invoice from quotation"
        );
        self.persist(&draft).await
    }

    /// Headers without lines, oldest first.
    pub async fn find_orphans(&self) -> ServiceResult<Vec<DocumentHeader>> {
        let orphans = self.store.find_orphans().await?;
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "Found documents without lines");
        }
        Ok(orphans)
    }

    /// Deletes every orphaned header and returns what was removed.
    pub async fn repair_orphans(&self) -> ServiceResult<Vec<DocumentHeader>> {
        let mut removed = Vec::new();

        for header in self.find_orphans().await? {
            // Skip anything that got its lines since the scan
            if self.store.count_lines(&header.id).await? > 0 {
                continue;
            }
            if self.store.delete_document(&header.id).await? {
                info!(document_id = %header.id, number = %header.number, "Removed orphaned document");
                removed.push(header);
            }
        }

        Ok(removed)
    }

    /// Re-attempts the line insert for a header that has no lines.
    pub async fn retry_lines(&self, document_id: &str, draft: &DocumentDraft) -> ServiceResult<()> {
        validate_draft(draft)?;

        let header = self
            .store
            .get_header(document_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document", document_id))?;

        let line_count = self.store.count_lines(document_id).await?;
        if line_count > 0 {
            return Err(ServiceError::NotOrphaned {
                document_id: document_id.to_string(),
                line_count,
            });
        }

        if let Err(source) = self.store.insert_lines(document_id, &draft.lines).await {
            error!(document_id = %document_id, error = %source, "Retrying lines failed");
            return Err(ServiceError::PartialWrite {
                document_id: header.id,
                number: header.number,
                source,
            });
        }

        info!(document_id = %document_id, number = %header.number, "Document lines restored");
        Ok(())
    }

    /// Loads a document with its party and lays it out for printing.
    ///
    /// Uses the stored totals as they are.
    pub async fn render_document(
        &self,
        id: &str,
        business: &BusinessProfile,
    ) -> ServiceResult<RenderedDocument> {
        let (document, party) = self.load_for_print(id).await?;
        Ok(render_aggregate(&document, &party, business))
    }

    /// Loads a document and its party.
    pub async fn load_for_print(&self, id: &str) -> ServiceResult<(DocumentAggregate, Party)> {
        let document = self.load_document(id).await?;
        let party_id = &document.header.party_id;
        let party = self
            .store
            .get_party(party_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Party", party_id.as_str()))?;
        Ok((document, party))
    }
}

/// Checks the parts of a draft the store relies on.
fn validate_draft(draft: &DocumentDraft) -> Result<(), ValidationError> {
    if draft.party_id.trim().is_empty() {
        return Err(ValidationError::required("party"));
    }
    if draft.lines.is_empty() {
        return Err(ValidationError::required("items"));
    }
    if let Some(line) = draft.lines.iter().find(|line| !line.is_consistent()) {
        return Err(ValidationError::InvalidFormat {
            field: "lines".to_string(),
            reason: format!("line {} total does not match unit price × quantity", line.position),
        });
    }
    Ok(())
}

// =============================================================================
// Catalog Lookup
// =============================================================================

/// Catalog search that never fails the caller.
///
/// Store errors are logged and reported as "no results".
#[derive(Debug, Clone)]
pub struct CatalogLookup<S> {
    store: S,
}

impl<S: CatalogStore> CatalogLookup<S> {
    pub fn new(store: S) -> Self {
        CatalogLookup { store }
    }

    /// Matching items, or an empty list when the lookup fails.
    pub async fn search(&self, query: &str) -> Vec<CatalogItem> {
        let query = match validate_search_query(query) {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, "Rejected catalog query");
                return Vec::new();
            }
        };

        match self.store.search_items(&query).await {
            Ok(items) => items,
            Err(e) => {
                warn!(query = %query, error = %e, "Catalog lookup failed");
                Vec::new()
            }
        }
    }

    /// One item by id, or `None` when missing or the lookup fails.
    pub async fn get(&self, id: &str) -> Option<CatalogItem> {
        match self.store.get_item(id).await {
            Ok(item) => item,
            Err(e) => {
                warn!(id = %id, error = %e, "Catalog lookup failed");
                None
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, DbResult};
    use crate::pool::{Database, DbConfig};
    use async_trait::async_trait;
    use chrono::Utc;
    use khata_core::{
        compose, Address, Adjustments, DateFields, DocumentLine, LineItemCart, Money, PartyKind,
        PriceTier, Rate,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(id: &str, name: &str, units: i64) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            hsn_code: Some("7408".to_string()),
            barcode: None,
            unit: "pcs".to_string(),
            tax_rate: Rate::from_bps(1800),
            selling_price: Money::from_units(units),
            mrp: Some(Money::from_units(units + 10)),
            wholesale_price: None,
            on_hand_qty: 50,
            sold_qty: 0,
            image_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn party(id: &str) -> Party {
        Party {
            id: id.to_string(),
            kind: PartyKind::Customer,
            name: "Ravi Kumar".to_string(),
            business_name: Some("Kumar Hardware".to_string()),
            phone: None,
            email: None,
            billing_address: Address {
                city: Some("Pune".to_string()),
                ..Address::default()
            },
            shipping_address: None,
            gstin: None,
            opening_balance: Money::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Scenario A cart: 2 × 100.00 + 1 × 50.00, 10% off, 18% tax.
    fn scenario_draft(kind: DocumentKind, party: &Party, round_off: bool) -> DocumentDraft {
        let mut cart = LineItemCart::new();
        let a = cart
            .add(Some(&item("item-a", "Copper Wire", 100)), PriceTier::Selling)
            .unwrap();
        cart.add(Some(&item("item-b", "Switch Plate", 50)), PriceTier::Selling);
        cart.set_quantity(a, 2).unwrap();

        compose(
            kind,
            Some(party),
            DateFields::issued(date(2024, 4, 1)).due(date(2024, 4, 30)),
            Some("Payment within 30 days"),
            &cart,
            Adjustments {
                discount_percent: Rate::from_bps(1000),
                tax_rate: Rate::from_bps(1800),
                round_off,
                ..Adjustments::default()
            },
        )
        .unwrap()
    }

    async fn setup() -> (Database, Party) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let party = party("party-1");
        db.parties().insert(&party).await.unwrap();
        (db, party)
    }

    /// Store whose line insert always fails; everything else hits the database.
    #[derive(Debug, Clone)]
    struct FailingLines {
        inner: Database,
    }

    #[async_trait]
    impl PartyStore for FailingLines {
        async fn get_party(&self, id: &str) -> DbResult<Option<Party>> {
            self.inner.get_party(id).await
        }
    }

    #[async_trait]
    impl DocumentStore for FailingLines {
        async fn insert_header(
            &self,
            draft: &DocumentDraft,
            scheme: &NumberingScheme,
        ) -> DbResult<DocumentHeader> {
            self.inner.insert_header(draft, scheme).await
        }

        async fn insert_lines(&self, _document_id: &str, _lines: &[DocumentLine]) -> DbResult<()> {
            Err(DbError::QueryFailed("disk I/O error".to_string()))
        }

        async fn get_header(&self, id: &str) -> DbResult<Option<DocumentHeader>> {
            self.inner.get_header(id).await
        }

        async fn get_lines(&self, document_id: &str) -> DbResult<Vec<DocumentLine>> {
            self.inner.get_lines(document_id).await
        }

        async fn count_lines(&self, document_id: &str) -> DbResult<i64> {
            self.inner.count_lines(document_id).await
        }

        async fn replace_document(
            &self,
            id: &str,
            draft: &DocumentDraft,
        ) -> DbResult<DocumentHeader> {
            self.inner.replace_document(id, draft).await
        }

        async fn find_orphans(&self) -> DbResult<Vec<DocumentHeader>> {
            self.inner.find_orphans().await
        }

        async fn delete_document(&self, id: &str) -> DbResult<bool> {
            self.inner.delete_document(id).await
        }
    }

    /// Catalog store that is always down.
    struct OfflineCatalog;

    #[async_trait]
    impl CatalogStore for OfflineCatalog {
        async fn search_items(&self, _query: &str) -> DbResult<Vec<CatalogItem>> {
            Err(DbError::ConnectionFailed("unreachable".to_string()))
        }

        async fn get_item(&self, _id: &str) -> DbResult<Option<CatalogItem>> {
            Err(DbError::ConnectionFailed("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());
        let draft = scenario_draft(DocumentKind::Quotation, &party, false);

        let header = service.persist(&draft).await.unwrap();
        assert_eq!(header.number, "QT-0001");
        assert_eq!(header.totals.total.minor(), 26_550);

        let doc = service.load_document(&header.id).await.unwrap();
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].item.name, "Copper Wire");
        assert_eq!(doc.lines[0].quantity, 2);
        assert_eq!(doc.header.totals.subtotal.minor(), 25_000);
        assert_eq!(doc.header.totals.discount.minor(), 2_500);
        assert_eq!(doc.header.totals.tax_amount.minor(), 4_050);
        assert_eq!(doc.header.due_date, Some(date(2024, 4, 30)));
    }

    #[tokio::test]
    async fn test_load_unknown_document() {
        let (db, _) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());

        let err = service.load_document("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_persist_rejects_empty_draft() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db.clone(), NumberingScheme::default());
        let mut draft = scenario_draft(DocumentKind::Invoice, &party, false);
        draft.lines.clear();

        let err = service.persist(&draft).await.unwrap_err();
        assert_eq!(err.to_string(), "items required");
        assert!(db.documents().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_rejects_tampered_line() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());
        let mut draft = scenario_draft(DocumentKind::Invoice, &party, false);
        draft.lines[0].line_total = Money::from_units(1);

        let err = service.persist(&draft).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_partial_write_leaves_detectable_orphan() {
        let (db, party) = setup().await;
        let service = DocumentService::new(
            FailingLines { inner: db.clone() },
            NumberingScheme::default(),
        );
        let draft = scenario_draft(DocumentKind::Invoice, &party, true);

        let (document_id, number) = match service.persist(&draft).await {
            Err(ServiceError::PartialWrite { document_id, number, .. }) => (document_id, number),
            other => panic!("expected partial write, got {other:?}"),
        };
        assert_eq!(number, "INV-0001");

        let header = db.documents().get_header(&document_id).await.unwrap();
        assert!(header.is_some());
        assert_eq!(db.documents().count_lines(&document_id).await.unwrap(), 0);

        let orphans = service.find_orphans().await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, document_id);
    }

    #[tokio::test]
    async fn test_retry_lines_completes_orphan() {
        let (db, party) = setup().await;
        let failing = DocumentService::new(
            FailingLines { inner: db.clone() },
            NumberingScheme::default(),
        );
        let draft = scenario_draft(DocumentKind::Invoice, &party, false);
        let document_id = match failing.persist(&draft).await {
            Err(ServiceError::PartialWrite { document_id, .. }) => document_id,
            other => panic!("expected partial write, got {other:?}"),
        };

        let healthy = DocumentService::new(db, NumberingScheme::default());
        healthy.retry_lines(&document_id, &draft).await.unwrap();

        let doc = healthy.load_document(&document_id).await.unwrap();
        assert_eq!(doc.lines.len(), 2);
        assert!(healthy.find_orphans().await.unwrap().is_empty());

        let err = healthy.retry_lines(&document_id, &draft).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotOrphaned { line_count: 2, .. }));
    }

    #[tokio::test]
    async fn test_repair_removes_only_orphans() {
        let (db, party) = setup().await;
        let healthy = DocumentService::new(db.clone(), NumberingScheme::default());
        let failing = DocumentService::new(
            FailingLines { inner: db.clone() },
            NumberingScheme::default(),
        );

        let kept = healthy
            .persist(&scenario_draft(DocumentKind::Invoice, &party, false))
            .await
            .unwrap();
        let err = failing
            .persist(&scenario_draft(DocumentKind::Invoice, &party, false))
            .await
            .unwrap_err();
        assert!(err.is_partial_write());

        let removed = healthy.repair_orphans().await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].number, "INV-0002");

        assert!(healthy.find_orphans().await.unwrap().is_empty());
        assert!(healthy.load_document(&kept.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_derive_invoice_from_quotation() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());
        let quote = service
            .persist(&scenario_draft(DocumentKind::Quotation, &party, true))
            .await
            .unwrap();

        let invoice = service.derive_invoice(&quote.id, date(2024, 4, 10)).await.unwrap();
        assert_eq!(invoice.kind, DocumentKind::Invoice);
        assert_eq!(invoice.number, "INV-0001");
        assert_ne!(invoice.id, quote.id);
        assert_eq!(invoice.source_document_id.as_deref(), Some(quote.id.as_str()));
        assert_eq!(invoice.totals, quote.totals);
        assert_eq!(invoice.terms, quote.terms);

        let source = service.load_document(&quote.id).await.unwrap();
        let derived = service.load_document(&invoice.id).await.unwrap();
        assert_eq!(derived.lines.len(), source.lines.len());
        for (d, s) in derived.lines.iter().zip(&source.lines) {
            assert_ne!(d.id, s.id);
            assert_eq!(d.item, s.item);
            assert_eq!(d.quantity, s.quantity);
            assert_eq!(d.unit_price, s.unit_price);
        }
    }

    #[tokio::test]
    async fn test_derive_invoice_requires_quotation() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());
        let invoice = service
            .persist(&scenario_draft(DocumentKind::Invoice, &party, false))
            .await
            .unwrap();

        let err = service
            .derive_invoice(&invoice.id, date(2024, 4, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::DocumentKindMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_rewrites_lines() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());
        let header = service
            .persist(&scenario_draft(DocumentKind::Quotation, &party, false))
            .await
            .unwrap();

        let stored = service.load_document(&header.id).await.unwrap();
        let mut cart = LineItemCart::from_lines(&stored.lines);
        let first = cart.lines()[0].id();
        cart.set_quantity(first, 3).unwrap();
        let edited = compose(
            DocumentKind::Quotation,
            Some(&party),
            DateFields::issued(date(2024, 4, 2)),
            None,
            &cart,
            stored.header.adjustments,
        )
        .unwrap();

        let updated = service.replace(&header.id, &edited).await.unwrap();
        assert_eq!(updated.number, header.number);
        assert_eq!(updated.totals.subtotal.minor(), 35_000);

        let reloaded = service.load_document(&header.id).await.unwrap();
        assert_eq!(reloaded.lines[0].quantity, 3);
        assert_eq!(reloaded.header.issue_date, date(2024, 4, 2));

        let mut wrong_kind = edited.clone();
        wrong_kind.kind = DocumentKind::Invoice;
        assert!(service.replace(&header.id, &wrong_kind).await.is_err());
    }

    #[tokio::test]
    async fn test_render_uses_stored_totals() {
        let (db, party) = setup().await;
        let service = DocumentService::new(db, NumberingScheme::default());
        let header = service
            .persist(&scenario_draft(DocumentKind::Invoice, &party, true))
            .await
            .unwrap();

        let rendered = service
            .render_document(&header.id, &BusinessProfile::default())
            .await
            .unwrap();
        assert_eq!(rendered.number, "INV-0001");
        assert_eq!(rendered.lines.len(), 2);
        let total = rendered.totals.last().unwrap();
        assert_eq!(total.amount, "₹266.00");
    }

    #[tokio::test]
    async fn test_render_missing_party() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = DocumentService::new(db, NumberingScheme::default());
        let ghost = party("ghost");
        let header = service
            .persist(&scenario_draft(DocumentKind::Invoice, &ghost, false))
            .await
            .unwrap();

        let err = service
            .render_document(&header.id, &BusinessProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { ref entity, .. } if entity == "Party"));
    }

    #[tokio::test]
    async fn test_lookup_degrades_to_empty() {
        let lookup = CatalogLookup::new(OfflineCatalog);
        assert!(lookup.search("wire").await.is_empty());
        assert!(lookup.get("item-a").await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_searches_store() {
        let (db, _) = setup().await;
        db.catalog().insert(&item("item-a", "Copper Wire", 100)).await.unwrap();
        db.catalog().insert(&item("item-b", "Switch Plate", 50)).await.unwrap();

        let lookup = CatalogLookup::new(db);
        let found = lookup.search("  wire ").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "item-a");
        assert_eq!(lookup.search("").await.len(), 2);
        assert!(lookup.get("item-b").await.is_some());
    }
}
