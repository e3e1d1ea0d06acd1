//! # Stock Key Normalization
//!
//! Item names, batches and party names are human-entered business
//! identifiers, not surrogate keys. The original data entry is free-form
//! ("Paracetamol" vs "paracetamol", "b42" vs "B42"), so every comparison in
//! the system goes through the single normalization rule defined here.
//!
//! ## The Rule
//! Item names AND batches compare case-insensitively, after trimming.
//! The storage layer mirrors this with `COLLATE NOCASE` columns, so an SQL
//! equality match and an in-memory key match always agree.

use serde::{Deserialize, Serialize};

/// Normalizes a business identifier: trim + lowercase.
#[inline]
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Builds the composite reconciliation key for an (item, batch) pair.
///
/// ## Example
/// ```rust
/// use pharmarx_core::stock::stock_key;
///
/// assert_eq!(stock_key("Paracetamol 500", "B42"), "paracetamol 500-b42");
/// assert_eq!(stock_key(" paracetamol 500 ", "b42"), "paracetamol 500-b42");
/// ```
#[inline]
pub fn stock_key(item_name: &str, batch: &str) -> String {
    format!("{}-{}", normalize(item_name), normalize(batch))
}

/// Whether two (item, batch) pairs identify the same stock.
#[inline]
pub fn same_stock(a_item: &str, a_batch: &str, b_item: &str, b_batch: &str) -> bool {
    normalize(a_item) == normalize(b_item) && normalize(a_batch) == normalize(b_batch)
}

/// Composite identity of one stock record: the unit of all reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub owner_email: String,
    pub item_name: String,
    pub batch: String,
}

impl StockKey {
    pub fn new(
        owner_email: impl Into<String>,
        item_name: impl Into<String>,
        batch: impl Into<String>,
    ) -> Self {
        StockKey {
            owner_email: owner_email.into(),
            item_name: item_name.into(),
            batch: batch.into(),
        }
    }

    /// The owner-independent reconciliation key.
    pub fn item_key(&self) -> String {
        stock_key(&self.item_name, &self.batch)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Paracetamol 500 "), "paracetamol 500");
        assert_eq!(normalize("B42"), "b42");
    }

    #[test]
    fn test_stock_key_is_case_insensitive() {
        assert_eq!(
            stock_key("Paracetamol", "B42"),
            stock_key("PARACETAMOL", "b42")
        );
    }

    #[test]
    fn test_same_stock() {
        assert!(same_stock("Crocin", "X1", "crocin ", "x1"));
        assert!(!same_stock("Crocin", "X1", "Crocin", "X2"));
    }

    #[test]
    fn test_item_key() {
        let key = StockKey::new("owner@pharmacy.com", "Crocin", "X1");
        assert_eq!(key.item_key(), "crocin-x1");
    }
}
