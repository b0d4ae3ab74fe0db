//! # Repository Module
//!
//! Database repository implementations for Khata.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  DocumentService / CLI command                                         │
//! │       │                                                                 │
//! │       │  db.documents().get_header(id)                                 │
//! │       ▼                                                                 │
//! │  DocumentRepository                                                    │
//! │  ├── insert_header(draft, scheme)   ← allocates the number             │
//! │  ├── insert_lines(id, lines)        ← one transaction                  │
//! │  ├── replace(id, draft)             ← header + lines, one transaction  │
//! │  └── find_orphans()                 ← headers with zero lines          │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, mapped through *Row records)            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - Catalog items and search
//! - [`PartyRepository`] - Customers and vendors
//! - [`DocumentRepository`] - Quotations, invoices and their lines

pub mod catalog;
pub mod document;
pub mod party;

pub use catalog::CatalogRepository;
pub use document::DocumentRepository;
pub use party::PartyRepository;

use khata_core::types::Rate;
use uuid::Uuid;

/// Reads a basis-point column. Out-of-range values clamp into `u32`.
pub(crate) fn rate_from_column(bps: i64) -> Rate {
    Rate::from_bps(bps.clamp(0, u32::MAX as i64) as u32)
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Generates a new row id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
