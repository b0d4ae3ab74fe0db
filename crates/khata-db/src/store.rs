//! # Store Traits
//!
//! The seams the document service and catalog lookup talk through.
//! [`Database`] implements all of them by delegating to its repositories.
//!
//! ```text
//! DocumentService<S: DocumentStore + PartyStore>
//! CatalogLookup<S: CatalogStore>
//!        │
//!        ▼
//! Database ──► CatalogRepository / PartyRepository / DocumentRepository
//! ```

use async_trait::async_trait;
use khata_core::{
    CatalogItem, DocumentDraft, DocumentHeader, DocumentLine, NumberingScheme, Party,
};

use crate::error::DbResult;
use crate::pool::Database;

/// Read access to catalog items.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn search_items(&self, query: &str) -> DbResult<Vec<CatalogItem>>;

    async fn get_item(&self, id: &str) -> DbResult<Option<CatalogItem>>;
}

/// Read access to parties.
#[async_trait]
pub trait PartyStore: Send + Sync {
    async fn get_party(&self, id: &str) -> DbResult<Option<Party>>;
}

/// Document header and line storage.
///
/// `insert_header` and `insert_lines` are separate steps; a caller that
/// sees the second fail owns the orphaned header.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocates the next number for the draft's kind and writes the header.
    async fn insert_header(
        &self,
        draft: &DocumentDraft,
        scheme: &NumberingScheme,
    ) -> DbResult<DocumentHeader>;

    /// Writes all lines or none.
    async fn insert_lines(&self, document_id: &str, lines: &[DocumentLine]) -> DbResult<()>;

    async fn get_header(&self, id: &str) -> DbResult<Option<DocumentHeader>>;

    async fn get_lines(&self, document_id: &str) -> DbResult<Vec<DocumentLine>>;

    async fn count_lines(&self, document_id: &str) -> DbResult<i64>;

    /// Rewrites header fields and lines atomically, keeping id and number.
    async fn replace_document(&self, id: &str, draft: &DocumentDraft) -> DbResult<DocumentHeader>;

    async fn find_orphans(&self) -> DbResult<Vec<DocumentHeader>>;

    async fn delete_document(&self, id: &str) -> DbResult<bool>;
}

#[async_trait]
impl CatalogStore for Database {
    async fn search_items(&self, query: &str) -> DbResult<Vec<CatalogItem>> {
        self.catalog().search(query).await
    }

    async fn get_item(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        self.catalog().get_by_id(id).await
    }
}

#[async_trait]
impl PartyStore for Database {
    async fn get_party(&self, id: &str) -> DbResult<Option<Party>> {
        self.parties().get_by_id(id).await
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn insert_header(
        &self,
        draft: &DocumentDraft,
        scheme: &NumberingScheme,
    ) -> DbResult<DocumentHeader> {
        self.documents().insert_header(draft, scheme).await
    }

    async fn insert_lines(&self, document_id: &str, lines: &[DocumentLine]) -> DbResult<()> {
        self.documents().insert_lines(document_id, lines).await
    }

    async fn get_header(&self, id: &str) -> DbResult<Option<DocumentHeader>> {
        self.documents().get_header(id).await
    }

    async fn get_lines(&self, document_id: &str) -> DbResult<Vec<DocumentLine>> {
        self.documents().get_lines(document_id).await
    }

    async fn count_lines(&self, document_id: &str) -> DbResult<i64> {
        self.documents().count_lines(document_id).await
    }

    async fn replace_document(&self, id: &str, draft: &DocumentDraft) -> DbResult<DocumentHeader> {
        self.documents().replace(id, draft).await
    }

    async fn find_orphans(&self) -> DbResult<Vec<DocumentHeader>> {
        self.documents().find_orphans().await
    }

    async fn delete_document(&self, id: &str) -> DbResult<bool> {
        self.documents().delete(id).await
    }
}
