//! # Purchase Ledger Repository
//!
//! Append-only storage for purchase bills and purchase-return bills, plus
//! the ledger reads that feed quantity reconciliation.
//!
//! ## Lenient Reads
//! Historical rows may carry NULL item names, batches, or quantities
//! (imported data predates validation). Ledger reads therefore decode into
//! [`LedgerLine`], whose fields are all optional - the reconciliation
//! engine skips what it cannot use instead of failing the whole query.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{
    insert_line_items, PURCHASE_ITEMS_TABLE, PURCHASE_RETURN_ITEMS_TABLE,
};
use pharmarx_core::reconcile::LedgerLine;
use pharmarx_core::types::{BillLineItem, PurchaseBill, PurchaseReturnBill};

const LEDGER_COLUMNS: &str =
    "i.item_name, i.batch, i.quantity, i.purchase_rate_cents, i.mrp_cents, i.expiry_date";

/// Repository for the purchase-side ledgers.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    // =========================================================================
    // Ledger reads
    // =========================================================================

    /// All purchased line items for one (owner, supplier) pair, across every
    /// purchase bill. Input to reconciliation.
    pub async fn purchase_lines(
        &self,
        owner_email: &str,
        supplier: &str,
    ) -> DbResult<Vec<LedgerLine>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS}
             FROM purchase_bill_items i
             JOIN purchase_bills b ON b.id = i.bill_id
             WHERE b.owner_email = ?1 AND b.party_name = ?2
             ORDER BY i.created_at, i.id"
        );

        let lines = sqlx::query_as::<_, LedgerLine>(&sql)
            .bind(owner_email)
            .bind(supplier)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            owner = %owner_email,
            supplier = %supplier,
            lines = lines.len(),
            "loaded purchase ledger"
        );

        Ok(lines)
    }

    /// All already-returned line items for one (owner, supplier) pair,
    /// across every purchase-return bill. Input to reconciliation.
    pub async fn return_lines(
        &self,
        owner_email: &str,
        supplier: &str,
    ) -> DbResult<Vec<LedgerLine>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS}
             FROM purchase_return_bill_items i
             JOIN purchase_return_bills b ON b.id = i.bill_id
             WHERE b.owner_email = ?1 AND b.party_name = ?2
             ORDER BY i.created_at, i.id"
        );

        let lines = sqlx::query_as::<_, LedgerLine>(&sql)
            .bind(owner_email)
            .bind(supplier)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Lists purchase bills for an owner, newest first.
    pub async fn list_bills(&self, owner_email: &str) -> DbResult<Vec<PurchaseBill>> {
        let bills = sqlx::query_as::<_, PurchaseBill>(
            "SELECT id, owner_email, invoice_number, party_name, bill_date,
                    total_cents, discount_cents, gst_cents, net_cents, created_at
             FROM purchase_bills
             WHERE owner_email = ?1
             ORDER BY created_at DESC",
        )
        .bind(owner_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    // =========================================================================
    // Ledger writes (caller owns the transaction)
    // =========================================================================

    /// Inserts a purchase bill header.
    pub async fn insert_bill(
        &self,
        conn: &mut SqliteConnection,
        bill: &PurchaseBill,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO purchase_bills (
                id, owner_email, invoice_number, party_name, bill_date,
                total_cents, discount_cents, gst_cents, net_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&bill.id)
        .bind(&bill.owner_email)
        .bind(&bill.invoice_number)
        .bind(&bill.party_name)
        .bind(bill.bill_date)
        .bind(bill.totals.total_cents)
        .bind(bill.totals.discount_cents)
        .bind(bill.totals.gst_cents)
        .bind(bill.totals.net_cents)
        .bind(bill.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts the line items of a purchase bill.
    pub async fn insert_items(
        &self,
        conn: &mut SqliteConnection,
        items: &[BillLineItem],
    ) -> DbResult<()> {
        insert_line_items(conn, PURCHASE_ITEMS_TABLE, items).await
    }

    /// Inserts a purchase-return bill header.
    pub async fn insert_return_bill(
        &self,
        conn: &mut SqliteConnection,
        bill: &PurchaseReturnBill,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO purchase_return_bills (
                id, owner_email, invoice_number, party_name, bill_date,
                total_cents, discount_cents, gst_cents, net_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&bill.id)
        .bind(&bill.owner_email)
        .bind(&bill.invoice_number)
        .bind(&bill.party_name)
        .bind(bill.bill_date)
        .bind(bill.totals.total_cents)
        .bind(bill.totals.discount_cents)
        .bind(bill.totals.gst_cents)
        .bind(bill.totals.net_cents)
        .bind(bill.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts the line items of a purchase-return bill.
    pub async fn insert_return_items(
        &self,
        conn: &mut SqliteConnection,
        items: &[BillLineItem],
    ) -> DbResult<()> {
        insert_line_items(conn, PURCHASE_RETURN_ITEMS_TABLE, items).await
    }
}
