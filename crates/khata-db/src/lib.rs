//! # khata-db: Database Layer for Khata
//!
//! This crate provides storage for catalog items, parties and documents.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata Data Flow                                  │
//! │                                                                         │
//! │  CLI command (document create)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khata-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │DocumentService│   │  Repositories  │   │  Migrations  │   │   │
//! │  │   │ (service.rs)  │   │                │   │  (embedded)  │   │   │
//! │  │   │               │   │ CatalogRepo    │   │              │   │   │
//! │  │   │ persist       │──►│ PartyRepo      │   │ 001_initial  │   │   │
//! │  │   │ load / repair │   │ DocumentRepo   │   │ 002_sequence │   │   │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘   │   │
//! │  │          ▲ store traits (store.rs), pool (pool.rs)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/khata/khata.db                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repository implementations (catalog, party, document)
//! - [`store`] - Store traits the service is written against
//! - [`service`] - Document persistence boundary and catalog lookup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khata_db::{Database, DbConfig, DocumentService};
//! use khata_core::NumberingScheme;
//!
//! let db = Database::new(DbConfig::new("path/to/khata.db")).await?;
//! let service = DocumentService::new(db.clone(), NumberingScheme::default());
//!
//! let header = service.persist(&draft).await?;
//! let doc = service.load_document(&header.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, DbLocation};
pub use service::{CatalogLookup, DocumentService};
pub use store::{CatalogStore, DocumentStore, PartyStore};

// Repository re-exports for convenience
pub use repository::{CatalogRepository, DocumentRepository, PartyRepository};
