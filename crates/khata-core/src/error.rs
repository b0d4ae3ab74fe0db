//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  khata-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - Persist boundary (incl. PartialWrite)          │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - What the operator sees (code + exit status)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → CliError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line id, document kind, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::DocumentKind;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart operation referenced a line id that is not in the cart.
    #[error("Line not found: {0}")]
    LineNotFound(u32),

    /// An operation needed a document of one kind but was given another.
    ///
    /// ## When This Occurs
    /// - Deriving an invoice from something that is not a quotation
    #[error("Expected {expected} but document {document_id} is {actual}")]
    DocumentKindMismatch {
        document_id: String,
        expected: DocumentKind,
        actual: DocumentKind,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write happens; no partial state is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    ///
    /// `compose` uses `party` and `items` as field names.
    #[error("{field} required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// The field the error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_messages() {
        assert_eq!(ValidationError::required("party").to_string(), "party required");
        assert_eq!(ValidationError::required("items").to_string(), "items required");
    }

    #[test]
    fn test_error_messages() {
        let err = CoreError::DocumentKindMismatch {
            document_id: "doc-1".to_string(),
            expected: DocumentKind::Quotation,
            actual: DocumentKind::Invoice,
        };
        assert_eq!(
            err.to_string(),
            "Expected quotation but document doc-1 is invoice"
        );
        assert_eq!(CoreError::LineNotFound(7).to_string(), "Line not found: 7");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("party").into();
        match core_err {
            CoreError::Validation(inner) => assert_eq!(inner.field(), "party"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
