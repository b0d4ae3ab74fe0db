//! # Catalog Lookup
//!
//! In-memory filter over catalog items. `CatalogRepository::search` in the
//! database crate loads the catalog and filters it here, so both lookups
//! fold case the same way (Unicode, not just ASCII).
//!
//! ## Matching
//! Case-insensitive substring over name, HSN code, barcode and unit.
//! An empty query returns every item. Input order is preserved, so equal
//! input always yields equal output.

use crate::types::CatalogItem;

/// Returns the items matching `query`, in input order.
pub fn search<'a>(items: &'a [CatalogItem], query: &str) -> Vec<&'a CatalogItem> {
    items.iter().filter(|item| item.matches(query)).collect()
}
