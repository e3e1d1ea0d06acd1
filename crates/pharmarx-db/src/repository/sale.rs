//! # Sale Ledger Repository
//!
//! Append-only storage for sale bills and sale-return bills.
//!
//! Sale-return validation needs the original bill's line items, and
//! purchase-return reconciliation needs every sold line for the owner;
//! both reads come from here.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{insert_line_items, SALE_ITEMS_TABLE, SALE_RETURN_ITEMS_TABLE};
use pharmarx_core::reconcile::LedgerLine;
use pharmarx_core::types::{BillLineItem, SaleBill, SaleReturnBill};

const LEDGER_COLUMNS: &str =
    "i.item_name, i.batch, i.quantity, i.purchase_rate_cents, i.mrp_cents, i.expiry_date";

/// Repository for the sale-side ledgers.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Finds a sale bill by its invoice number (case-insensitive, like every
    /// business identifier).
    pub async fn find_by_invoice(
        &self,
        owner_email: &str,
        invoice_number: &str,
    ) -> DbResult<Option<SaleBill>> {
        let bill = sqlx::query_as::<_, SaleBill>(
            "SELECT id, owner_email, invoice_number, party_name, gst_number, bill_date,
                    total_cents, discount_cents, gst_cents, net_cents, created_at
             FROM sale_bills
             WHERE owner_email = ?1 AND invoice_number = ?2 COLLATE NOCASE",
        )
        .bind(owner_email)
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Returns the highest sale invoice number on record for an owner.
    ///
    /// `INV` + zero-padded sequence: within the pad width plain string
    /// ordering matches issue order, but past it (`INV1000` vs `INV999`) a
    /// longer number is always the larger one, so length sorts first.
    pub async fn latest_invoice_number(&self, owner_email: &str) -> DbResult<Option<String>> {
        let invoice: Option<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM sale_bills
             WHERE owner_email = ?1
             ORDER BY LENGTH(invoice_number) DESC, invoice_number DESC
             LIMIT 1",
        )
        .bind(owner_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// All sold line items for an owner, across every sale bill. Input to
    /// purchase-return reconciliation.
    pub async fn sale_lines(&self, owner_email: &str) -> DbResult<Vec<LedgerLine>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS}
             FROM sale_bill_items i
             JOIN sale_bills b ON b.id = i.bill_id
             WHERE b.owner_email = ?1
             ORDER BY i.created_at, i.id"
        );

        let lines = sqlx::query_as::<_, LedgerLine>(&sql)
            .bind(owner_email)
            .fetch_all(&self.pool)
            .await?;

        debug!(owner = %owner_email, lines = lines.len(), "loaded sale ledger");

        Ok(lines)
    }

    /// Line items of one sale bill, for sale-return validation.
    pub async fn items_for_bill(&self, bill_id: &str) -> DbResult<Vec<LedgerLine>> {
        let lines = sqlx::query_as::<_, LedgerLine>(
            "SELECT item_name, batch, quantity, purchase_rate_cents, mrp_cents, expiry_date
             FROM sale_bill_items
             WHERE bill_id = ?1
             ORDER BY created_at, id",
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists sale bills for an owner, newest first.
    pub async fn list_bills(&self, owner_email: &str) -> DbResult<Vec<SaleBill>> {
        let bills = sqlx::query_as::<_, SaleBill>(
            "SELECT id, owner_email, invoice_number, party_name, gst_number, bill_date,
                    total_cents, discount_cents, gst_cents, net_cents, created_at
             FROM sale_bills
             WHERE owner_email = ?1
             ORDER BY created_at DESC",
        )
        .bind(owner_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    // =========================================================================
    // Writes (caller owns the transaction)
    // =========================================================================

    /// Inserts a sale bill header.
    pub async fn insert_bill(&self, conn: &mut SqliteConnection, bill: &SaleBill) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_bills (
                id, owner_email, invoice_number, party_name, gst_number, bill_date,
                total_cents, discount_cents, gst_cents, net_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&bill.id)
        .bind(&bill.owner_email)
        .bind(&bill.invoice_number)
        .bind(&bill.party_name)
        .bind(&bill.gst_number)
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

    /// Inserts the line items of a sale bill.
    pub async fn insert_items(
        &self,
        conn: &mut SqliteConnection,
        items: &[BillLineItem],
    ) -> DbResult<()> {
        insert_line_items(conn, SALE_ITEMS_TABLE, items).await
    }

    /// Inserts a sale-return bill header.
    pub async fn insert_return_bill(
        &self,
        conn: &mut SqliteConnection,
        bill: &SaleReturnBill,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_return_bills (
                id, owner_email, invoice_number, origin_invoice, party_name, bill_date,
                total_cents, discount_cents, gst_cents, net_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&bill.id)
        .bind(&bill.owner_email)
        .bind(&bill.invoice_number)
        .bind(&bill.origin_invoice)
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

    /// Inserts the line items of a sale-return bill.
    pub async fn insert_return_items(
        &self,
        conn: &mut SqliteConnection,
        items: &[BillLineItem],
    ) -> DbResult<()> {
        insert_line_items(conn, SALE_RETURN_ITEMS_TABLE, items).await
    }
}
