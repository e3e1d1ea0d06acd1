//! # Domain Types
//!
//! Core domain types used throughout PharmaRx.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │ InventoryRecord │   │  PurchaseBill   │   │    SaleBill     │        │
//! │  │  ─────────────  │   │    SaleBill     │   │     items:      │        │
//! │  │  the ONLY       │   │ SaleReturnBill  │   │  BillLineItem   │        │
//! │  │  mutable entity │   │PurchaseReturn…  │   │  (frozen at     │        │
//! │  │  (quantity)     │   │  (append-only)  │   │  creation time) │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────────┐                     │
//! │  │   ExpiryRecord  │   │ CustomerPurchaseRecord   │                     │
//! │  │  swept snapshot │   │ reporting aggregate      │                     │
//! │  └─────────────────┘   └──────────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every row has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business identity: (owner_email, item_name, batch) for inventory,
//!   (owner_email, invoice_number) for bills - human-entered, case-insensitive

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Percent
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1200 bps = 12% (a common GST slab); 500 bps = 5% discount.
/// Keeping rates in integers keeps every amount calculation in integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Percent(u32);

impl Percent {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn as_percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }
}

// =============================================================================
// Bill Totals
// =============================================================================

/// Bill-level totals, frozen at creation time.
///
/// `net_cents = total_cents − discount_cents` across all line items;
/// GST is carried separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillTotals {
    pub total_cents: i64,
    pub discount_cents: i64,
    pub gst_cents: i64,
    pub net_cents: i64,
}

impl BillTotals {
    /// Accumulates one line's frozen amounts into the bill totals.
    pub fn add_line(&mut self, amounts: &crate::money::LineAmounts) {
        self.total_cents += amounts.total.cents();
        self.discount_cents += amounts.discount.cents();
        self.gst_cents += amounts.gst.cents();
        self.net_cents += amounts.net.cents();
    }
}

// =============================================================================
// Inventory Record
// =============================================================================

/// The mutable stock record for one (owner, item, batch) key.
///
/// Created on first purchase of the key; incremented by purchases and
/// sale-returns; decremented by sales and purchase-returns; deleted only by
/// the expiry sweep (which emits an [`ExpiryRecord`]). The quantity must
/// never go negative as an end state - decrements are issued as atomic
/// conditional updates at the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant scope; every query filters on this field.
    pub owner_email: String,

    /// Item name - business identifier, case-insensitive.
    pub item_name: String,

    /// Batch identifier - case-insensitive (one consistent rule system-wide).
    pub batch: String,

    /// Current stock quantity. Never negative as an end state.
    pub quantity: i64,

    /// Last purchase rate in cents (last-write-wins across purchases).
    pub purchase_rate_cents: i64,

    /// Last MRP in cents (last-write-wins across purchases).
    pub mrp_cents: i64,

    /// GST rate in basis points.
    pub gst_bps: u32,

    /// Expiry date of the batch, if known.
    pub expiry_date: Option<NaiveDate>,

    /// Pack description (e.g., "10x10 tablets").
    pub pack: Option<String>,

    /// Free-text description.
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Returns the MRP as a Money type.
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_cents(self.mrp_cents)
    }

    /// Returns the purchase rate as a Money type.
    #[inline]
    pub fn purchase_rate(&self) -> Money {
        Money::from_cents(self.purchase_rate_cents)
    }

    /// Returns the GST rate.
    #[inline]
    pub fn gst(&self) -> Percent {
        Percent::from_bps(self.gst_bps)
    }

    /// Whether the batch is expired as of the given date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry < today)
    }
}

// =============================================================================
// Ledger Entries (append-only bills)
// =============================================================================

/// A purchase bill: stock bought from a supplier. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseBill {
    pub id: String,
    pub owner_email: String,
    /// Supplier's invoice number, unique per (owner, bill type).
    pub invoice_number: String,
    /// Supplier name - business identifier, case-insensitive.
    pub party_name: String,
    pub bill_date: NaiveDate,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub totals: BillTotals,
    pub created_at: DateTime<Utc>,
}

/// A sale bill: stock sold to a customer. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleBill {
    pub id: String,
    pub owner_email: String,
    /// `INV` + zero-padded sequence, unique per owner.
    pub invoice_number: String,
    /// Customer/party name.
    pub party_name: String,
    /// Customer GST number; one per bill (all line items must agree).
    pub gst_number: String,
    pub bill_date: NaiveDate,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub totals: BillTotals,
    pub created_at: DateTime<Utc>,
}

/// A sale-return bill: a customer returns items from one named sale bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleReturnBill {
    pub id: String,
    pub owner_email: String,
    pub invoice_number: String,
    /// The originating sale invoice. Informational reference - return
    /// validation re-reads the original bill's line items.
    pub origin_invoice: String,
    pub party_name: String,
    pub bill_date: NaiveDate,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub totals: BillTotals,
    pub created_at: DateTime<Utc>,
}

/// A purchase-return bill: stock returned to a supplier, bounded by the
/// reconciled returnable quantity rather than any single originating invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseReturnBill {
    pub id: String,
    pub owner_email: String,
    /// `PRET` + last 6 digits of the creation timestamp.
    pub invoice_number: String,
    /// Supplier name.
    pub party_name: String,
    pub bill_date: NaiveDate,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub totals: BillTotals,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bill Line Item
// =============================================================================

/// A line item as written into a ledger. All amount fields are computed at
/// bill-creation time and frozen (snapshot pattern) - later rate changes
/// never alter historical bills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillLineItem {
    pub id: String,
    pub bill_id: String,
    pub item_name: String,
    pub batch: String,
    pub quantity: i64,
    /// Purchase rate at bill time; zero on sale-side ledgers.
    pub purchase_rate_cents: i64,
    pub mrp_cents: i64,
    pub discount_bps: u32,
    pub gst_bps: u32,
    pub expiry_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub totals: BillTotals,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer Purchase History
// =============================================================================

/// One historical sale line for a customer, keyed by (owner, GST number).
/// Appended on every sale; used for reporting, never for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerPurchaseRecord {
    pub id: String,
    pub owner_email: String,
    pub gst_number: String,
    pub party_name: String,
    pub invoice_number: String,
    pub item_name: String,
    pub batch: String,
    pub quantity: i64,
    pub mrp_cents: i64,
    pub net_cents: i64,
    pub sold_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expiry Record
// =============================================================================

/// Snapshot of an inventory record removed by the expiry sweep.
/// A record can only be swept once, since the sweep deletes its source row
/// in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpiryRecord {
    pub id: String,
    pub owner_email: String,
    pub item_name: String,
    pub batch: String,
    pub quantity: i64,
    pub purchase_rate_cents: i64,
    pub mrp_cents: i64,
    pub gst_bps: u32,
    pub expiry_date: NaiveDate,
    pub pack: Option<String>,
    pub description: Option<String>,
    pub swept_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_from_bps() {
        let rate = Percent::from_bps(1200);
        assert_eq!(rate.bps(), 1200);
        assert!((rate.as_percentage() - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_bill_totals_accumulate() {
        use crate::money::{LineAmounts, Money};

        let mut totals = BillTotals::default();
        totals.add_line(&LineAmounts::compute(
            2,
            Money::from_cents(1000),
            Percent::from_bps(1000),
            Percent::from_bps(1200),
        ));
        totals.add_line(&LineAmounts::compute(
            1,
            Money::from_cents(500),
            Percent::zero(),
            Percent::zero(),
        ));

        assert_eq!(totals.total_cents, 2500);
        assert_eq!(totals.discount_cents, 200);
        assert_eq!(totals.net_cents, 2300);
        assert_eq!(totals.net_cents, totals.total_cents - totals.discount_cents);
    }

    #[test]
    fn test_inventory_is_expired() {
        let record = InventoryRecord {
            id: "x".into(),
            owner_email: "o@p.com".into(),
            item_name: "Paracetamol".into(),
            batch: "B1".into(),
            quantity: 10,
            purchase_rate_cents: 100,
            mrp_cents: 150,
            gst_bps: 1200,
            expiry_date: Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            pack: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(record.is_expired(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
        assert!(!record.is_expired(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()));
    }
}
