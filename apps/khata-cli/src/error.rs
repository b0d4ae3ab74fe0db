//! # CLI Error Type
//!
//! Every command returns `Result<_, CliError>`. The error code decides the
//! process exit status so scripts can tell a partial write from a clean
//! failure.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ErrorCode          exit   typical source                              │
//! │  ─────────          ────   ──────────────                              │
//! │  ValidationError      2    "party required", bad --item spec           │
//! │  NotFound             3    unknown document / party id                 │
//! │  LookupFailure        4    catalog item could not be resolved         │
//! │  PartialWrite         5    header saved, lines not (run repair)        │
//! │  DatabaseError        6    sqlx / SQLite failure                       │
//! │  ConfigError          7    unreadable or invalid khata.toml            │
//! │  Internal             1    anything else                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use khata_core::{CoreError, ValidationError};
use khata_db::{DbError, ServiceError};
use serde::Serialize;

/// Error reported by a command.
///
/// With `--json` this is what gets printed:
/// ```json
/// { "code": "PARTIAL_WRITE", "message": "Document INV-0007 (...) was saved without its lines: ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    LookupFailure,
    PartialWrite,
    DatabaseError,
    ConfigError,
    Internal,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::LookupFailure => 4,
            ErrorCode::PartialWrite => 5,
            ErrorCode::DatabaseError => 6,
            ErrorCode::ConfigError => 7,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::LookupFailure, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ConfigError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }

    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::LineNotFound(id) => CliError::not_found("Line", &id.to_string()),
            other @ CoreError::DocumentKindMismatch { .. } => CliError::validation(other.to_string()),
        }
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::Invalid(e) => e.into(),
            DbError::UniqueViolation { field, .. } => {
                CliError::validation(format!("Duplicate value for {}", field))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CliError::validation("Invalid reference")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                CliError::new(ErrorCode::DatabaseError, other.to_string())
            }
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => e.into(),
            ServiceError::Core(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            partial @ ServiceError::PartialWrite { .. } => CliError::new(
                ErrorCode::PartialWrite,
                format!("{partial}. Run `khata document repair` to list or remove it."),
            ),
            other @ ServiceError::NotOrphaned { .. } => CliError::validation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_write_gets_own_exit_code() {
        let err: CliError = ServiceError::PartialWrite {
            document_id: "d1".to_string(),
            number: "INV-0002".to_string(),
            source: DbError::QueryFailed("disk full".to_string()),
        }
        .into();

        assert_eq!(err.code, ErrorCode::PartialWrite);
        assert_eq!(err.exit_code(), 5);
        assert!(err.message.contains("INV-0002"));
        assert!(err.message.contains("repair"));
    }

    #[test]
    fn test_validation_messages_pass_through() {
        let err: CliError = ServiceError::from(CoreError::Validation(ValidationError::required(
            "party",
        )))
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "party required");
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            ErrorCode::NotFound,
            ErrorCode::ValidationError,
            ErrorCode::LookupFailure,
            ErrorCode::PartialWrite,
            ErrorCode::DatabaseError,
            ErrorCode::ConfigError,
            ErrorCode::Internal,
        ];
        let mut exits: Vec<i32> = codes.iter().map(|c| c.exit_code()).collect();
        exits.sort_unstable();
        exits.dedup();
        assert_eq!(exits.len(), codes.len());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&CliError::not_found("Document", "x")).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Document not found: x"}"#);
    }
}
