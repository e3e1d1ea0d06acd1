//! # Quantity Reconciliation Engine
//!
//! The central algorithm of PharmaRx: derive returnable quantities from the
//! full ledger history instead of storing them as mutable counters.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Reconciliation for (owner, supplier) scope                 │
//! │                                                                         │
//! │  purchase ledger ──► + purchased_qty ┐                                  │
//! │  sale ledger     ──► + sold_qty      ├─ per (item, batch) key           │
//! │  return ledger   ──► + returned_qty  ┘                                  │
//! │                                                                         │
//! │  returnable = purchased − sold − returned                               │
//! │                                                                         │
//! │  Emit only keys that were purchased AND have returnable > 0             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sale ledger is deliberately NOT filtered by counterparty: once a unit
//! is sold to *any* customer it can no longer be returned to the supplier,
//! so the total sold quantity is subtracted regardless of buyer.
//!
//! ## Lenient Ingestion
//! Historical ledger rows imported from other systems can be malformed. A
//! line missing its item name, batch, or quantity is silently skipped - it
//! contributes nothing and never aborts the computation. The engine itself
//! cannot fail; only the storage fetch that feeds it can.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stock::stock_key;

// =============================================================================
// Input / Output Types
// =============================================================================

/// One ledger line as read from storage for reconciliation.
///
/// Every field is optional: the engine tolerates malformed historical rows
/// rather than failing the whole computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerLine {
    pub item_name: Option<String>,
    pub batch: Option<String>,
    pub quantity: Option<i64>,
    pub purchase_rate_cents: Option<i64>,
    pub mrp_cents: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
}

impl LedgerLine {
    /// Convenience constructor for well-formed lines.
    pub fn new(item_name: &str, batch: &str, quantity: i64) -> Self {
        LedgerLine {
            item_name: Some(item_name.to_string()),
            batch: Some(batch.to_string()),
            quantity: Some(quantity),
            ..Default::default()
        }
    }
}

/// Reconciled quantities for one (item, batch) key within a counterparty
/// scope. Only keys with `returnable_qty > 0` are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Item name as first seen in the purchase ledger (display casing).
    pub item_name: String,
    /// Batch as first seen in the purchase ledger.
    pub batch: String,
    pub purchased_qty: i64,
    pub sold_qty: i64,
    pub returned_qty: i64,
    /// purchased − sold − returned. Always positive in emitted results.
    pub returnable_qty: i64,
    /// Latest purchase rate seen in the purchase ledger for the key
    /// (last-write-wins, not averaged).
    pub purchase_rate_cents: i64,
    /// Latest MRP seen in the purchase ledger for the key.
    pub mrp_cents: i64,
    /// Latest expiry date seen in the purchase ledger for the key.
    pub expiry_date: Option<NaiveDate>,
}

// =============================================================================
// Accumulator
// =============================================================================

#[derive(Debug, Default)]
struct KeyTotals {
    item_name: String,
    batch: String,
    purchased: i64,
    sold: i64,
    returned: i64,
    /// Keys never seen in the purchase ledger are dropped from the output,
    /// even if items were sold or returned under them.
    purchased_seen: bool,
    purchase_rate_cents: i64,
    mrp_cents: i64,
    expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Purchased,
    Sold,
    Returned,
}

fn accumulate(totals: &mut BTreeMap<String, KeyTotals>, lines: &[LedgerLine], side: Side) {
    for line in lines {
        // Lenient-ingestion policy: skip lines missing any key component.
        let (Some(item_name), Some(batch), Some(quantity)) =
            (line.item_name.as_deref(), line.batch.as_deref(), line.quantity)
        else {
            continue;
        };
        if item_name.trim().is_empty() || batch.trim().is_empty() {
            continue;
        }

        let key = stock_key(item_name, batch);
        let entry = totals.entry(key).or_insert_with(|| KeyTotals {
            item_name: item_name.trim().to_string(),
            batch: batch.trim().to_string(),
            ..Default::default()
        });

        match side {
            Side::Purchased => {
                entry.purchased += quantity;
                entry.purchased_seen = true;

                // Last-write-wins across the purchase ledger only. Sale and
                // return rows carry sale-time values (and a zero purchase
                // rate) that must not leak into return pricing.
                if let Some(rate) = line.purchase_rate_cents {
                    entry.purchase_rate_cents = rate;
                }
                if let Some(mrp) = line.mrp_cents {
                    entry.mrp_cents = mrp;
                }
                if let Some(expiry) = line.expiry_date {
                    entry.expiry_date = Some(expiry);
                }
            }
            Side::Sold => entry.sold += quantity,
            Side::Returned => entry.returned += quantity,
        }
    }
}

// =============================================================================
// The Engine
// =============================================================================

/// Computes returnable quantities per (item, batch) key from the scoped
/// ledgers.
///
/// ## Arguments
/// * `purchases` - purchase lines for (owner, counterparty)
/// * `sales` - sale lines for the owner (all customers - intentional)
/// * `returns` - lines already returned to this counterparty
///
/// ## Guarantees
/// - `returnable_qty == purchased_qty − sold_qty − returned_qty` for every
///   emitted key, and emitted keys always have `returnable_qty > 0`
/// - aggregation is order-independent: permuting the input lines yields
///   identical totals
/// - output is sorted by item name (case-insensitive), then batch (ordinal)
pub fn reconcile(
    purchases: &[LedgerLine],
    sales: &[LedgerLine],
    returns: &[LedgerLine],
) -> Vec<ReconciliationResult> {
    let mut totals: BTreeMap<String, KeyTotals> = BTreeMap::new();

    accumulate(&mut totals, purchases, Side::Purchased);
    accumulate(&mut totals, sales, Side::Sold);
    accumulate(&mut totals, returns, Side::Returned);

    let mut results: Vec<ReconciliationResult> = totals
        .into_values()
        .filter(|t| t.purchased_seen)
        .filter_map(|t| {
            let returnable = t.purchased - t.sold - t.returned;
            if returnable <= 0 {
                return None;
            }
            Some(ReconciliationResult {
                item_name: t.item_name,
                batch: t.batch,
                purchased_qty: t.purchased,
                sold_qty: t.sold,
                returned_qty: t.returned,
                returnable_qty: returnable,
                purchase_rate_cents: t.purchase_rate_cents,
                mrp_cents: t.mrp_cents,
                expiry_date: t.expiry_date,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        a.item_name
            .to_lowercase()
            .cmp(&b.item_name.to_lowercase())
            .then_with(|| a.batch.cmp(&b.batch))
    });

    results
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item: &str, batch: &str, qty: i64) -> LedgerLine {
        LedgerLine::new(item, batch, qty)
    }

    #[test]
    fn test_conservation() {
        // purchased 100, sold 40, returned 10 → returnable 50
        let purchases = vec![line("Crocin", "B1", 60), line("Crocin", "B1", 40)];
        let sales = vec![line("Crocin", "B1", 40)];
        let returns = vec![line("Crocin", "B1", 10)];

        let results = reconcile(&purchases, &sales, &returns);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.purchased_qty, 100);
        assert_eq!(r.sold_qty, 40);
        assert_eq!(r.returned_qty, 10);
        assert_eq!(r.returnable_qty, 50);
        assert_eq!(r.returnable_qty, r.purchased_qty - r.sold_qty - r.returned_qty);
    }

    #[test]
    fn test_non_positive_returnable_is_omitted() {
        // purchased 10, sold 10 → returnable 0 → omitted
        let results = reconcile(
            &[line("Crocin", "B1", 10)],
            &[line("Crocin", "B1", 10)],
            &[],
        );
        assert!(results.is_empty());

        // sold more than purchased (other suppliers) → still omitted
        let results = reconcile(
            &[line("Crocin", "B1", 10)],
            &[line("Crocin", "B1", 25)],
            &[],
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_sold_only_keys_are_absent() {
        // never purchased from this counterparty → key absent entirely,
        // never surfaced as negative-returnable
        let results = reconcile(&[], &[line("Crocin", "B1", 5)], &[line("Dolo", "B2", 3)]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_order_independence() {
        let mut purchases = vec![
            line("Crocin", "B1", 30),
            line("Dolo", "B2", 20),
            line("Crocin", "B1", 70),
        ];
        let mut sales = vec![line("crocin", "b1", 15), line("Dolo", "B2", 5)];
        let returns = vec![line("CROCIN", "B1", 10)];

        let forward = reconcile(&purchases, &sales, &returns);

        purchases.reverse();
        sales.reverse();
        let reversed = reconcile(&purchases, &sales, &returns);

        assert_eq!(forward, reversed);
        assert_eq!(forward[0].returnable_qty, 75); // Crocin: 100 − 15 − 10
        assert_eq!(forward[1].returnable_qty, 15); // Dolo: 20 − 5
    }

    #[test]
    fn test_case_insensitive_key_matching() {
        let results = reconcile(
            &[line("Paracetamol", "B42", 50)],
            &[line("PARACETAMOL", "b42", 20)],
            &[],
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].returnable_qty, 30);
        // Display casing comes from the purchase ledger.
        assert_eq!(results[0].item_name, "Paracetamol");
        assert_eq!(results[0].batch, "B42");
    }

    #[test]
    fn test_malformed_lines_are_skipped_not_fatal() {
        let mut missing_batch = line("Crocin", "B1", 10);
        missing_batch.batch = None;

        let mut missing_qty = line("Dolo", "B2", 0);
        missing_qty.quantity = None;

        let blank_item = LedgerLine {
            item_name: Some("   ".to_string()),
            batch: Some("B3".to_string()),
            quantity: Some(7),
            ..Default::default()
        };

        let purchases = vec![line("Crocin", "B1", 40), missing_batch, missing_qty, blank_item];
        let results = reconcile(&purchases, &[], &[]);

        // Only the well-formed line contributes.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].purchased_qty, 40);
    }

    #[test]
    fn test_sale_lines_do_not_clobber_purchase_rates() {
        let mut purchase = line("Crocin", "B1", 100);
        purchase.purchase_rate_cents = Some(900);
        purchase.mrp_cents = Some(1250);
        purchase.expiry_date = NaiveDate::from_ymd_opt(2027, 6, 30);

        // Sale ledgers store a literal 0 purchase rate, not NULL.
        let mut sale = line("Crocin", "B1", 40);
        sale.purchase_rate_cents = Some(0);
        sale.mrp_cents = Some(1250);

        let results = reconcile(&[purchase], &[sale], &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].returnable_qty, 60);
        assert_eq!(results[0].purchase_rate_cents, 900);
        assert_eq!(results[0].mrp_cents, 1250);
        assert_eq!(results[0].expiry_date, NaiveDate::from_ymd_opt(2027, 6, 30));
    }

    #[test]
    fn test_last_write_wins_rates() {
        let mut first = line("Crocin", "B1", 10);
        first.purchase_rate_cents = Some(100);
        first.mrp_cents = Some(150);

        let mut second = line("Crocin", "B1", 10);
        second.purchase_rate_cents = Some(120);

        let results = reconcile(&[first, second], &[], &[]);
        assert_eq!(results[0].purchase_rate_cents, 120);
        // Second line had no MRP, so the first one's value stands.
        assert_eq!(results[0].mrp_cents, 150);
    }

    #[test]
    fn test_output_sorted_by_item_then_batch() {
        let purchases = vec![
            line("dolo", "B9", 5),
            line("Crocin", "B2", 5),
            line("Crocin", "B1", 5),
        ];
        let results = reconcile(&purchases, &[], &[]);
        let keys: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.item_name.as_str(), r.batch.as_str()))
            .collect();
        assert_eq!(keys, vec![("Crocin", "B1"), ("Crocin", "B2"), ("dolo", "B9")]);
    }
}
