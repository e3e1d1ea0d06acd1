//! # Error Types
//!
//! Domain-specific error types for pharmarx-core.
//!
//! ## Error Hierarchy
//! ```text
//! pharmarx-core errors (this file)
//! ├── CoreError        - Business rule violations
//! └── ValidationError  - Field-level input validation failures
//!
//! pharmarx-db errors (separate crate)
//! └── DbError          - Database operation failures
//!
//! pharmarx-billing errors (separate crate)
//! └── BillingError     - Coordinator error taxonomy
//!                        (MissingField / Validation / NotFound /
//!                         Conflict / Storage)
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name + batch, quantities)
//! 3. Errors are enum variants, never String
//!
//! Every stock-related variant carries the offending item name and batch so
//! the caller can identify and correct the specific line item.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while validating a proposed bill.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required request field is absent or empty.
    ///
    /// Returned before any storage write is attempted.
    #[error("{field} is required")]
    MissingField { field: String },

    /// Sale line items reference more than one customer GST number.
    #[error("line items carry different GST numbers: '{expected}' and '{found}'")]
    GstMismatch { expected: String, found: String },

    /// Requested sale quantity exceeds the live inventory quantity.
    #[error(
        "insufficient stock for {item_name} (batch {batch}): available {available}, requested {requested}"
    )]
    InsufficientStock {
        item_name: String,
        batch: String,
        available: i64,
        requested: i64,
    },

    /// Sale line item has no inventory record at all.
    #[error("{item_name} (batch {batch}) not found in inventory")]
    NotInInventory { item_name: String, batch: String },

    /// Purchase-return quantity exceeds the reconciled returnable quantity
    /// (purchased − sold − already returned) for the supplier scope.
    #[error(
        "return quantity for {item_name} (batch {batch}) exceeds returnable stock: returnable {returnable}, requested {requested}"
    )]
    ExceedsReturnable {
        item_name: String,
        batch: String,
        returnable: i64,
        requested: i64,
    },

    /// Sale-return quantity exceeds the quantity on the original sale bill.
    #[error(
        "return quantity for {item_name} (batch {batch}) exceeds the original bill: original {original}, requested {requested}"
    )]
    ExceedsOriginal {
        item_name: String,
        batch: String,
        original: i64,
        requested: i64,
    },

    /// Sale-return line item does not appear on the referenced sale bill.
    #[error("{item_name} (batch {batch}) is not present on the original bill")]
    NotOnOriginalBill { item_name: String, batch: String },

    /// Field-level validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation errors.
///
/// These occur when a request field doesn't meet format requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
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

    /// Invalid format (e.g., malformed GST number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
    fn test_error_messages_identify_the_line_item() {
        let err = CoreError::InsufficientStock {
            item_name: "Paracetamol 500".to_string(),
            batch: "B42".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Paracetamol 500 (batch B42): available 3, requested 5"
        );

        let err = CoreError::ExceedsReturnable {
            item_name: "Paracetamol 500".to_string(),
            batch: "B42".to_string(),
            returnable: 50,
            requested: 51,
        };
        assert!(err.to_string().contains("Paracetamol 500"));
        assert!(err.to_string().contains("B42"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
