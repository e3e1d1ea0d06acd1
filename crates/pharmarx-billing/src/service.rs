//! # Bill Transaction Coordinator
//!
//! Validates each bill request against the live ledgers and applies it as
//! one atomic write.
//!
//! ## Transaction Shape Per Bill Kind
//! ```text
//! ┌─────────────┬──────────────────────────────────────────────────────────┐
//! │ purchase    │ upsert inventory per line  + bill + items                │
//! │ sale        │ conditional decrement/line + bill + items + history      │
//! │ sale-return │ restock per line           + bill + items                │
//! │ purchase-   │ reconcile (reads, pre-tx), then                          │
//! │ return      │ conditional decrement/line + bill + items                │
//! └─────────────┴──────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure inside the transaction drops it, which rolls everything
//! back - a bill can never be half-written.
//!
//! ## Stock Decrements
//! All stock-taking flows use the storage layer's atomic conditional
//! decrement. The coordinator never computes `new_qty = old_qty - n` from a
//! value it read earlier, so two concurrent bills against the same batch
//! cannot both succeed past the available quantity.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use pharmarx_core::invoice::{next_sale_invoice, purchase_return_invoice, sale_return_invoice};
use pharmarx_core::money::{LineAmounts, Money};
use pharmarx_core::reconcile::{reconcile, ReconciliationResult};
use pharmarx_core::request::{
    BillRequest, PurchaseBillRequest, PurchaseReturnBillRequest, SaleBillRequest,
    SaleReturnBillRequest,
};
use pharmarx_core::stock::stock_key;
use pharmarx_core::types::{
    BillLineItem, BillTotals, CustomerPurchaseRecord, Percent, PurchaseBill, PurchaseReturnBill,
    SaleBill, SaleReturnBill,
};
use pharmarx_core::CoreError;
use pharmarx_db::repository::generate_id;
use pharmarx_db::Database;

use crate::error::{BillingError, BillingResult};

/// A bill persisted by [`BillingService::create_bill`].
#[derive(Debug, Clone)]
pub enum CreatedBill {
    Purchase(PurchaseBill),
    Sale(SaleBill),
    SaleReturn(SaleReturnBill),
    PurchaseReturn(PurchaseReturnBill),
}

impl CreatedBill {
    /// The invoice number of the created bill, whichever kind it is.
    pub fn invoice_number(&self) -> &str {
        match self {
            CreatedBill::Purchase(b) => &b.invoice_number,
            CreatedBill::Sale(b) => &b.invoice_number,
            CreatedBill::SaleReturn(b) => &b.invoice_number,
            CreatedBill::PurchaseReturn(b) => &b.invoice_number,
        }
    }
}

/// The bill transaction coordinator.
#[derive(Debug, Clone)]
pub struct BillingService {
    db: Database,
}

impl BillingService {
    /// Creates a new BillingService over a database handle.
    pub fn new(db: Database) -> Self {
        BillingService { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a bill of any kind. Dispatches on the request variant.
    pub async fn create_bill(
        &self,
        owner_email: &str,
        request: BillRequest,
    ) -> BillingResult<CreatedBill> {
        match request {
            BillRequest::Purchase(req) => self
                .create_purchase_bill(owner_email, req)
                .await
                .map(CreatedBill::Purchase),
            BillRequest::Sale(req) => self
                .create_sale_bill(owner_email, req)
                .await
                .map(CreatedBill::Sale),
            BillRequest::SaleReturn(req) => self
                .create_sale_return_bill(owner_email, req)
                .await
                .map(CreatedBill::SaleReturn),
            BillRequest::PurchaseReturn(req) => self
                .create_purchase_return_bill(owner_email, req)
                .await
                .map(CreatedBill::PurchaseReturn),
        }
    }

    // =========================================================================
    // Purchase
    // =========================================================================

    /// Records a purchase: tops up (or creates) the inventory record for
    /// every line, then persists the ledger entry.
    pub async fn create_purchase_bill(
        &self,
        owner_email: &str,
        request: PurchaseBillRequest,
    ) -> BillingResult<PurchaseBill> {
        request.validate()?;

        let now = Utc::now();
        let bill_id = generate_id();
        let mut totals = BillTotals::default();
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let amounts = LineAmounts::compute(
                line.quantity,
                Money::from_cents(line.purchase_rate_cents),
                Percent::from_bps(line.discount_bps),
                Percent::from_bps(line.gst_bps),
            );
            totals.add_line(&amounts);
            items.push(BillLineItem {
                id: generate_id(),
                bill_id: bill_id.clone(),
                item_name: line.item_name.trim().to_string(),
                batch: line.batch.trim().to_string(),
                quantity: line.quantity,
                purchase_rate_cents: line.purchase_rate_cents,
                mrp_cents: line.mrp_cents,
                discount_bps: line.discount_bps,
                gst_bps: line.gst_bps,
                expiry_date: line.expiry_date,
                totals: amounts_to_totals(&amounts),
                created_at: now,
            });
        }

        let bill = PurchaseBill {
            id: bill_id,
            owner_email: owner_email.to_string(),
            invoice_number: request.invoice_number.trim().to_string(),
            party_name: request.party_name.trim().to_string(),
            bill_date: request.bill_date,
            totals,
            created_at: now,
        };

        let inventory = self.db.inventory();
        let purchases = self.db.purchases();

        let mut tx = self.db.pool().begin().await?;

        for line in &request.items {
            inventory.apply_purchase(&mut tx, owner_email, line).await?;
        }
        purchases.insert_bill(&mut tx, &bill).await?;
        purchases.insert_items(&mut tx, &items).await?;

        tx.commit().await?;

        info!(
            owner = %owner_email,
            invoice = %bill.invoice_number,
            supplier = %bill.party_name,
            lines = items.len(),
            "purchase bill created"
        );

        Ok(bill)
    }

    // =========================================================================
    // Sale
    // =========================================================================

    /// Records a sale: atomically takes stock for every line, persists the
    /// ledger entry, and appends the customer's purchase history.
    pub async fn create_sale_bill(
        &self,
        owner_email: &str,
        request: SaleBillRequest,
    ) -> BillingResult<SaleBill> {
        let gst_number = request.validate()?;

        let now = Utc::now();
        let bill_id = generate_id();
        let mut totals = BillTotals::default();
        let mut items = Vec::with_capacity(request.items.len());
        let mut history = Vec::with_capacity(request.items.len());

        let bill = {
            let mut bill = SaleBill {
                id: bill_id.clone(),
                owner_email: owner_email.to_string(),
                invoice_number: request.invoice_number.trim().to_string(),
                party_name: request.party_name.trim().to_string(),
                gst_number: gst_number.clone(),
                bill_date: request.bill_date,
                totals: BillTotals::default(),
                created_at: now,
            };

            for line in &request.items {
                let amounts = LineAmounts::compute(
                    line.quantity,
                    Money::from_cents(line.mrp_cents),
                    Percent::from_bps(line.discount_bps),
                    Percent::from_bps(line.gst_bps),
                );
                totals.add_line(&amounts);
                items.push(BillLineItem {
                    id: generate_id(),
                    bill_id: bill_id.clone(),
                    item_name: line.item_name.trim().to_string(),
                    batch: line.batch.trim().to_string(),
                    quantity: line.quantity,
                    purchase_rate_cents: 0,
                    mrp_cents: line.mrp_cents,
                    discount_bps: line.discount_bps,
                    gst_bps: line.gst_bps,
                    expiry_date: None,
                    totals: amounts_to_totals(&amounts),
                    created_at: now,
                });
                history.push(CustomerPurchaseRecord {
                    id: generate_id(),
                    owner_email: owner_email.to_string(),
                    gst_number: gst_number.clone(),
                    party_name: bill.party_name.clone(),
                    invoice_number: bill.invoice_number.clone(),
                    item_name: line.item_name.trim().to_string(),
                    batch: line.batch.trim().to_string(),
                    quantity: line.quantity,
                    mrp_cents: line.mrp_cents,
                    net_cents: amounts.net.cents(),
                    sold_on: request.bill_date,
                    created_at: now,
                });
            }

            bill.totals = totals;
            bill
        };

        let inventory = self.db.inventory();
        let sales = self.db.sales();

        let mut tx = self.db.pool().begin().await?;

        for line in &request.items {
            let taken = inventory
                .conditional_decrement(
                    &mut tx,
                    owner_email,
                    line.item_name.trim(),
                    line.batch.trim(),
                    line.quantity,
                )
                .await?;

            if taken == 0 {
                // Distinguish "no record" from "not enough stock" for the
                // error message; the transaction is dropped either way.
                let available = inventory
                    .quantity(&mut tx, owner_email, line.item_name.trim(), line.batch.trim())
                    .await?;

                let err = match available {
                    Some(available) => CoreError::InsufficientStock {
                        item_name: line.item_name.trim().to_string(),
                        batch: line.batch.trim().to_string(),
                        available,
                        requested: line.quantity,
                    },
                    None => CoreError::NotInInventory {
                        item_name: line.item_name.trim().to_string(),
                        batch: line.batch.trim().to_string(),
                    },
                };
                warn!(owner = %owner_email, error = %err, "sale rejected");
                return Err(err.into());
            }
        }

        sales.insert_bill(&mut tx, &bill).await?;
        sales.insert_items(&mut tx, &items).await?;
        self.db.history().append(&mut tx, &history).await?;

        tx.commit().await?;

        info!(
            owner = %owner_email,
            invoice = %bill.invoice_number,
            customer = %bill.party_name,
            lines = items.len(),
            "sale bill created"
        );

        Ok(bill)
    }

    // =========================================================================
    // Sale return
    // =========================================================================

    /// Records a sale-return: every returned line must appear on the
    /// originating sale bill, bounded by the originally sold quantity.
    /// Returned stock goes back into inventory.
    pub async fn create_sale_return_bill(
        &self,
        owner_email: &str,
        request: SaleReturnBillRequest,
    ) -> BillingResult<SaleReturnBill> {
        request.validate()?;

        let sales = self.db.sales();
        let origin = sales
            .find_by_invoice(owner_email, request.origin_invoice.trim())
            .await?
            .ok_or_else(|| {
                BillingError::not_found("sale bill", request.origin_invoice.trim().to_string())
            })?;

        // Aggregate the original bill's lines per stock key: an item can
        // appear on several lines and the return bound is their sum.
        struct OriginalLine {
            item_name: String,
            batch: String,
            quantity: i64,
            mrp_cents: i64,
        }
        let mut original: HashMap<String, OriginalLine> = HashMap::new();
        for line in sales.items_for_bill(&origin.id).await? {
            let (Some(item_name), Some(batch), Some(quantity)) =
                (line.item_name, line.batch, line.quantity)
            else {
                continue;
            };
            let entry = original
                .entry(stock_key(&item_name, &batch))
                .or_insert_with(|| OriginalLine {
                    item_name: item_name.trim().to_string(),
                    batch: batch.trim().to_string(),
                    quantity: 0,
                    mrp_cents: 0,
                });
            entry.quantity += quantity;
            if let Some(mrp) = line.mrp_cents {
                entry.mrp_cents = mrp;
            }
        }

        let now = Utc::now();
        let bill_id = generate_id();
        let mut totals = BillTotals::default();
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let key = stock_key(&line.item_name, &line.batch);
            let Some(sold) = original.get(&key) else {
                return Err(CoreError::NotOnOriginalBill {
                    item_name: line.item_name.trim().to_string(),
                    batch: line.batch.trim().to_string(),
                }
                .into());
            };
            if line.quantity > sold.quantity {
                return Err(CoreError::ExceedsOriginal {
                    item_name: sold.item_name.clone(),
                    batch: sold.batch.clone(),
                    original: sold.quantity,
                    requested: line.quantity,
                }
                .into());
            }

            // Refund amounts at the sold MRP; discount/GST are not reversed
            // line-by-line on returns.
            let amounts = LineAmounts::compute(
                line.quantity,
                Money::from_cents(sold.mrp_cents),
                Percent::zero(),
                Percent::zero(),
            );
            totals.add_line(&amounts);
            items.push(BillLineItem {
                id: generate_id(),
                bill_id: bill_id.clone(),
                item_name: sold.item_name.clone(),
                batch: sold.batch.clone(),
                quantity: line.quantity,
                purchase_rate_cents: 0,
                mrp_cents: sold.mrp_cents,
                discount_bps: 0,
                gst_bps: 0,
                expiry_date: None,
                totals: amounts_to_totals(&amounts),
                created_at: now,
            });
        }

        let bill = SaleReturnBill {
            id: bill_id,
            owner_email: owner_email.to_string(),
            invoice_number: sale_return_invoice(now),
            origin_invoice: origin.invoice_number.clone(),
            party_name: request.party_name.trim().to_string(),
            bill_date: request.bill_date,
            totals,
            created_at: now,
        };

        let inventory = self.db.inventory();

        let mut tx = self.db.pool().begin().await?;

        for item in &items {
            inventory
                .restock(
                    &mut tx,
                    owner_email,
                    &item.item_name,
                    &item.batch,
                    item.quantity,
                    item.mrp_cents,
                    item.gst_bps,
                )
                .await?;
        }
        sales.insert_return_bill(&mut tx, &bill).await?;
        sales.insert_return_items(&mut tx, &items).await?;

        tx.commit().await?;

        info!(
            owner = %owner_email,
            invoice = %bill.invoice_number,
            origin = %bill.origin_invoice,
            lines = items.len(),
            "sale-return bill created"
        );

        Ok(bill)
    }

    // =========================================================================
    // Purchase return
    // =========================================================================

    /// Records a purchase-return: the reconciliation engine bounds each
    /// line by `purchased − sold − already returned` within the supplier
    /// scope, then stock is taken with the same conditional decrement a
    /// sale uses.
    pub async fn create_purchase_return_bill(
        &self,
        owner_email: &str,
        request: PurchaseReturnBillRequest,
    ) -> BillingResult<PurchaseReturnBill> {
        request.validate()?;

        let supplier = request.party_name.trim();
        let returnable = self.returnable_stock(owner_email, supplier).await?;
        let by_key: HashMap<String, &ReconciliationResult> = returnable
            .iter()
            .map(|r| (stock_key(&r.item_name, &r.batch), r))
            .collect();

        let now = Utc::now();
        let bill_id = generate_id();
        let mut totals = BillTotals::default();
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let key = stock_key(&line.item_name, &line.batch);
            let reconciled = match by_key.get(&key).copied() {
                Some(r) if line.quantity <= r.returnable_qty => r,
                found => {
                    let err = CoreError::ExceedsReturnable {
                        item_name: line.item_name.trim().to_string(),
                        batch: line.batch.trim().to_string(),
                        returnable: found.map(|r| r.returnable_qty).unwrap_or(0),
                        requested: line.quantity,
                    };
                    warn!(owner = %owner_email, supplier = %supplier, error = %err,
                        "purchase-return rejected");
                    return Err(err.into());
                }
            };
            let amounts = LineAmounts::compute(
                line.quantity,
                Money::from_cents(reconciled.purchase_rate_cents),
                Percent::zero(),
                Percent::zero(),
            );
            totals.add_line(&amounts);
            items.push(BillLineItem {
                id: generate_id(),
                bill_id: bill_id.clone(),
                item_name: reconciled.item_name.clone(),
                batch: reconciled.batch.clone(),
                quantity: line.quantity,
                purchase_rate_cents: reconciled.purchase_rate_cents,
                mrp_cents: reconciled.mrp_cents,
                discount_bps: 0,
                gst_bps: 0,
                expiry_date: reconciled.expiry_date,
                totals: amounts_to_totals(&amounts),
                created_at: now,
            });
        }

        let bill = PurchaseReturnBill {
            id: bill_id,
            owner_email: owner_email.to_string(),
            invoice_number: purchase_return_invoice(now),
            party_name: supplier.to_string(),
            bill_date: request.bill_date,
            totals,
            created_at: now,
        };

        let inventory = self.db.inventory();
        let purchases = self.db.purchases();

        let mut tx = self.db.pool().begin().await?;

        for item in &items {
            // The ledgers said the quantity is returnable, but the live
            // inventory row is the arbiter: a sale committed since the
            // reconciliation read may have taken the stock.
            let taken = inventory
                .conditional_decrement(
                    &mut tx,
                    owner_email,
                    &item.item_name,
                    &item.batch,
                    item.quantity,
                )
                .await?;

            if taken == 0 {
                return Err(BillingError::Conflict(format!(
                    "stock for {} (batch {}) changed during return processing",
                    item.item_name, item.batch
                )));
            }
        }

        purchases.insert_return_bill(&mut tx, &bill).await?;
        purchases.insert_return_items(&mut tx, &items).await?;

        tx.commit().await?;

        info!(
            owner = %owner_email,
            invoice = %bill.invoice_number,
            supplier = %bill.party_name,
            lines = items.len(),
            "purchase-return bill created"
        );

        Ok(bill)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The next sale invoice number for an owner (`INV005` when the owner
    /// has no sale bills yet).
    ///
    /// The number is not reserved: two concurrent callers can receive the
    /// same candidate, and the UNIQUE (owner, invoice_number) index turns
    /// the second bill into a Conflict.
    pub async fn next_sale_invoice_number(&self, owner_email: &str) -> BillingResult<String> {
        let latest = self.db.sales().latest_invoice_number(owner_email).await?;
        Ok(next_sale_invoice(latest.as_deref()))
    }

    /// Reconciled returnable quantities for an (owner, supplier) scope.
    pub async fn returnable_stock(
        &self,
        owner_email: &str,
        supplier: &str,
    ) -> BillingResult<Vec<ReconciliationResult>> {
        let purchases = self.db.purchases();

        let purchased = purchases.purchase_lines(owner_email, supplier).await?;
        let sold = self.db.sales().sale_lines(owner_email).await?;
        let returned = purchases.return_lines(owner_email, supplier).await?;

        Ok(reconcile(&purchased, &sold, &returned))
    }
}

fn amounts_to_totals(amounts: &LineAmounts) -> BillTotals {
    let mut totals = BillTotals::default();
    totals.add_line(amounts);
    totals
}
