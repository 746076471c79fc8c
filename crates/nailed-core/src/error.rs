//! # Error Types
//!
//! Domain-specific error types for nailed-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  nailed-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger and domain rule failures                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  nailed-db errors (separate crate)                                     │
//! │  └── DbError          - Persistence failures, wraps CoreError          │
//! │                                                                         │
//! │  nailed-server errors                                                  │
//! │  └── ApiError         - What HTTP clients see (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by ledger rules and input checks.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale line (or EXIT adjustment) asks for more units than are on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale: 8 × P1
    ///      │
    ///      ▼
    /// Re-read stock inside the transaction: available=7
    ///      │
    ///      ▼
    /// InsufficientStock { code: "P1", available: 7, requested: 8 }
    ///      │
    ///      ▼
    /// Transaction rolled back, nothing written
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// A document has more lines than allowed.
    #[error("Document cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// A bulk import row failed validation. `row` is 1-based.
    #[error("Import row {row}: {reason}")]
    InvalidImportRow { row: usize, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_product() {
        let err = CoreError::InsufficientStock {
            code: "P1".to_string(),
            available: 7,
            requested: 8,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P1: available 7, requested 8"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        };
        assert_eq!(err.to_string(), "stock must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_import_row_message() {
        let err = CoreError::InvalidImportRow {
            row: 3,
            reason: "code is required".to_string(),
        };
        assert_eq!(err.to_string(), "Import row 3: code is required");
    }
}
