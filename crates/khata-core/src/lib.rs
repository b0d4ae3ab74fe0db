//! # khata-core: Pure Business Logic for Khata
//!
//! This crate is the **heart** of Khata. It contains the document-pricing
//! engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    khata-cli (commands)                         │   │
//! │  │    catalog search ──► document create ──► document print       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐          │   │
//! │  │   │ catalog │─►│  cart   │─►│ pricing │─►│composer │          │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘          │   │
//! │  │                                           render (read side)   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khata-db (Database Layer)                    │   │
//! │  │        SQLite, migrations, repositories, persist / repair      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CatalogItem, Party, DocumentHeader, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - Catalog lookup filter
//! - [`cart`] - Line-item cart
//! - [`pricing`] - Discount / tax / round-off pipeline
//! - [`composer`] - Draft composition and derivation
//! - [`numbering`] - Display numbers
//! - [`render`] - Print layout
//! - [`error`] - Domain error types
//! - [`validation`] - Validation and numeric coercion
//!
//! ## Example Usage
//!
//! ```rust
//! use khata_core::money::Money;
//! use khata_core::pricing::{price, Adjustments};
//! use khata_core::types::Rate;
//!
//! let adjustments = Adjustments {
//!     discount_percent: Rate::from_bps(1000), // 10%
//!     tax_rate: Rate::from_bps(1800),         // 18% GST
//!     ..Adjustments::default()
//! };
//!
//! let totals = price(Money::from_units(250), &adjustments);
//! assert_eq!(totals.total.to_string(), "265.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod composer;
pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod render;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, LineId, LineItemCart};
pub use composer::{compose, derive_from, DateFields, DocumentDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use numbering::NumberingScheme;
pub use pricing::{price, price_cart, Adjustments, PricingBreakdown};
pub use render::{render, RenderedDocument};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound for a single line quantity.
///
/// Keeps `unit_price × quantity` far away from `i64` overflow.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest amount accepted from form input, in minor units (10 trillion).
///
/// `coerce_amount` clamps to this; stored totals stay far inside `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;
