//! # Validation Module
//!
//! Field-level validation for bill request payloads.
//!
//! ## Validation Strategy
//! ```text
//! Layer 1: Deserialization (serde)
//! ├── Type validation (tagged bill variants, numeric fields)
//! │
//! Layer 2: THIS MODULE - field rules
//! ├── Required fields, lengths, positive quantities
//! │
//! Layer 3: Business rules (request.rs + billing service)
//! ├── GST agreement, stock bounds, returnable bounds
//! │
//! Layer 4: Database (SQLite)
//! └── UNIQUE invoice numbers, CHECK quantity >= 0
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_RATE_BPS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text business identifier (item name, party
/// name, invoice number).
///
/// ## Rules
/// - must not be empty after trimming
/// - must be at most `max` characters
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an item name.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_required("item_name", name, 200)
}

/// Validates a batch identifier.
pub fn validate_batch(batch: &str) -> ValidationResult<()> {
    validate_required("batch", batch, 50)
}

/// Validates a customer GST number.
///
/// ## Rules
/// - required, at most 20 characters
/// - alphanumeric only (GSTIN format is letters + digits)
pub fn validate_gst_number(gst: &str) -> ValidationResult<()> {
    validate_required("gst_number", gst, 20)?;

    if !gst.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "gst_number".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - must be positive (> 0)
/// - must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a rate/MRP in cents. Zero is allowed (free samples).
pub fn validate_rate_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount/GST rate in basis points.
///
/// ## Rules
/// - must not exceed [`MAX_RATE_BPS`] (100%); a discount past that would
///   freeze negative net amounts into the ledger
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > MAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

/// Coerces a free-form quantity string to an integer: parse-or-zero.
///
/// Historical imports carry quantities as strings; a non-numeric value
/// contributes 0 rather than aborting the whole computation.
///
/// ## Example
/// ```rust
/// use pharmarx_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity("12"), 12);
/// assert_eq!(parse_quantity(" 7 "), 7);
/// assert_eq!(parse_quantity("a dozen"), 0);
/// assert_eq!(parse_quantity(""), 0);
/// ```
pub fn parse_quantity(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Paracetamol 500").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_batch() {
        assert!(validate_batch("B42").is_ok());
        assert!(validate_batch("").is_err());
        assert!(validate_batch(&"B".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_gst_number() {
        assert!(validate_gst_number("27AAPFU0939F1ZV").is_ok());
        assert!(validate_gst_number("").is_err());
        assert!(validate_gst_number("27-AAPFU/0939").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9_999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn test_validate_rate_cents() {
        assert!(validate_rate_cents("mrp", 0).is_ok());
        assert!(validate_rate_cents("mrp", 1250).is_ok());
        assert!(validate_rate_cents("mrp", -1).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps("discount", 0).is_ok());
        assert!(validate_rate_bps("discount", 10_000).is_ok());
        assert!(validate_rate_bps("discount", 10_001).is_err());
    }

    #[test]
    fn test_parse_quantity_is_parse_or_zero() {
        assert_eq!(parse_quantity("42"), 42);
        assert_eq!(parse_quantity("-3"), -3);
        assert_eq!(parse_quantity("4.5"), 0);
        assert_eq!(parse_quantity("NaN"), 0);
    }
}
