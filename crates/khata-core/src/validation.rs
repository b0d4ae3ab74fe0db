//! # Validation Module
//!
//! Input validation and coercion utilities for Khata.
//!
//! ## Two Policies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Input Handling                                     │
//! │                                                                         │
//! │  Numeric form fields (amounts, rates, quantities)                       │
//! │  └── COERCE: missing / unparseable / negative → 0 (qty → 1)            │
//! │                                                                         │
//! │  Identity & structure (party, items, ids, names)                       │
//! │  └── VALIDATE: return ValidationError, abort before any write          │
//! │                                                                         │
//! │  Database (SQLite) adds NOT NULL, UNIQUE and CHECK constraints         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khata_core::validation::{coerce_amount, coerce_quantity};
//!
//! assert_eq!(coerce_amount("12.5").minor(), 1250);
//! assert_eq!(coerce_amount("abc").minor(), 0);
//! assert_eq!(coerce_quantity("-3"), 1);
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CatalogItem, Rate};
use crate::{MAX_AMOUNT_MINOR, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Coercion
// =============================================================================

/// Parses a monetary amount. Missing, unparseable or negative input is zero;
/// anything above [`MAX_AMOUNT_MINOR`] (including digit strings too long for
/// `i64`) is clamped to it.
pub fn coerce_amount(input: &str) -> Money {
    let input = input.trim();
    match Money::parse_decimal(input) {
        Some(amount) => Money::from_minor(amount.minor().clamp(0, MAX_AMOUNT_MINOR)),
        None if is_overlong_amount(input) => Money::from_minor(MAX_AMOUNT_MINOR),
        None => Money::zero(),
    }
}

/// A plain positive decimal whose digits overflow `i64`.
fn is_overlong_amount(input: &str) -> bool {
    let digits = input.strip_prefix('+').unwrap_or(input);
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}

/// Parses a percentage ("18", "8.25", "12.5%"). Anything invalid is zero.
pub fn coerce_rate(input: &str) -> Rate {
    let trimmed = input.trim().trim_end_matches('%').trim();
    // Reuse the two-decimal parser: "8.25" → 825 minor units → 825 bps
    match Money::parse_decimal(trimmed) {
        Some(value) if value.is_positive() => {
            Rate::from_bps(value.minor().min(u32::MAX as i64) as u32)
        }
        _ => Rate::zero(),
    }
}

/// Parses a line quantity, clamping into `1..=MAX_LINE_QUANTITY`.
///
/// Unparseable input becomes 1, matching the cart's clamp rule.
pub fn coerce_quantity(input: &str) -> i64 {
    clamp_quantity(input.trim().parse::<i64>().unwrap_or(1))
}

/// Clamps a quantity into `1..=MAX_LINE_QUANTITY`.
#[inline]
pub fn clamp_quantity(qty: i64) -> i64 {
    qty.clamp(1, MAX_LINE_QUANTITY)
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (item or party).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns the full catalog)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates free-text terms printed at the foot of a document.
pub fn validate_terms(terms: &str) -> ValidationResult<()> {
    if terms.chars().count() > 4000 {
        return Err(ValidationError::TooLong {
            field: "terms".to_string(),
            max: 4000,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_rate_bps(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates an amount in `0..=MAX_AMOUNT_MINOR` (prices may be zero).
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.minor() > MAX_AMOUNT_MINOR {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_MINOR,
        });
    }

    Ok(())
}

/// Checks the catalog item invariants before it is stored.
///
/// ## Rules
/// - Name and unit present
/// - Every defined tier price non-negative
/// - On-hand and sold quantities non-negative
pub fn validate_catalog_item(item: &CatalogItem) -> ValidationResult<()> {
    validate_name("name", &item.name)?;
    validate_name("unit", &item.unit)?;
    validate_rate_bps("tax_rate", item.tax_rate)?;
    validate_amount("selling_price", item.selling_price)?;
    if let Some(mrp) = item.mrp {
        validate_amount("mrp", mrp)?;
    }
    if let Some(wholesale) = item.wholesale_price {
        validate_amount("wholesale_price", wholesale)?;
    }
    if item.on_hand_qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "on_hand_qty".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    if item.sold_qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "sold_qty".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
