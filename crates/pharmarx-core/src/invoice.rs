//! # Invoice Number Generation
//!
//! Persisted invoice numbers follow fixed literal formats that existing
//! stored data and printed documents depend on:
//!
//! - Sale bills: `INV` + 3-digit zero-padded sequence (`INV005`, `INV006`, …)
//! - Purchase-return bills: `PRET` + last 6 digits of the creation
//!   timestamp in milliseconds (`PRET483921`)
//!
//! The sale sequence is derived from the highest existing invoice for the
//! owner - no gap-filling, no reuse guarantee. Concurrent creation can race
//! to the same candidate number; the UNIQUE (owner, invoice_number) index at
//! the storage layer turns the loser into a Conflict instead of a duplicate.

use chrono::{DateTime, Utc};

/// Prefix for sale invoice numbers.
pub const SALE_INVOICE_PREFIX: &str = "INV";

/// Prefix for purchase-return invoice numbers.
pub const PURCHASE_RETURN_PREFIX: &str = "PRET";

/// Prefix for sale-return invoice numbers.
pub const SALE_RETURN_PREFIX: &str = "SRET";

/// The documented default starting number, used when an owner has no prior
/// sale bills (or the latest number cannot be parsed).
pub const DEFAULT_SALE_INVOICE: &str = "INV005";

/// Derives the next sale invoice number from the latest existing one.
///
/// ## Rules
/// - `None` → [`DEFAULT_SALE_INVOICE`]
/// - strip the alphabetic prefix, parse the trailing digits, add 1,
///   re-pad to 3 digits: `INV004` → `INV005`
/// - an unparseable number falls back to the default
///
/// ## Example
/// ```rust
/// use pharmarx_core::invoice::next_sale_invoice;
///
/// assert_eq!(next_sale_invoice(Some("INV004")), "INV005");
/// assert_eq!(next_sale_invoice(None), "INV005");
/// ```
pub fn next_sale_invoice(latest: Option<&str>) -> String {
    let Some(latest) = latest else {
        return DEFAULT_SALE_INVOICE.to_string();
    };

    let digits: String = latest
        .trim()
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic())
        .collect();

    match digits.parse::<u64>() {
        Ok(sequence) => format!("{}{:03}", SALE_INVOICE_PREFIX, sequence + 1),
        Err(_) => DEFAULT_SALE_INVOICE.to_string(),
    }
}

/// Builds a purchase-return invoice number from the creation instant.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use pharmarx_core::invoice::purchase_return_invoice;
///
/// let at = Utc.timestamp_millis_opt(1_700_000_483_921).unwrap();
/// assert_eq!(purchase_return_invoice(at), "PRET483921");
/// ```
pub fn purchase_return_invoice(at: DateTime<Utc>) -> String {
    let suffix = at.timestamp_millis().rem_euclid(1_000_000);
    format!("{}{:06}", PURCHASE_RETURN_PREFIX, suffix)
}

/// Builds a sale-return invoice number from the creation instant. Same
/// scheme as purchase returns, distinct prefix.
pub fn sale_return_invoice(at: DateTime<Utc>) -> String {
    let suffix = at.timestamp_millis().rem_euclid(1_000_000);
    format!("{}{:06}", SALE_RETURN_PREFIX, suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================
