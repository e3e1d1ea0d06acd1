//! # Billing Error Taxonomy
//!
//! Every coordinator operation fails with one of five categories, so callers
//! can map outcomes to a response without inspecting message strings:
//!
//! ```text
//! MissingField / Validation  → reject the request, nothing was written
//! NotFound                   → referenced entity does not exist
//! Conflict                   → a concurrent write won (duplicate invoice,
//!                              stock raced below the requested quantity)
//! Storage                    → the database failed; transaction rolled back
//! ```

use thiserror::Error;

use pharmarx_core::CoreError;
use pharmarx_db::DbError;

/// Errors surfaced by the bill transaction coordinator.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Business rule or field validation failure (includes MissingField).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {detail}")]
    NotFound { entity: String, detail: String },

    /// Lost a race against a concurrent write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failure; the surrounding transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BillingError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            detail: detail.into(),
        }
    }
}

/// Maps storage-layer errors into the coordinator taxonomy.
impl From<DbError> for BillingError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => BillingError::NotFound { entity, detail: id },
            DbError::UniqueViolation { field, .. } => {
                BillingError::Conflict(format!("duplicate {field}"))
            }
            other => BillingError::Storage(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::from(DbError::from(err))
    }
}

/// Result type for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;
