//! # Customer Purchase History Repository
//!
//! Reporting aggregate keyed by (owner, customer GST number). Appended in
//! the same transaction as the sale bill so the two can never disagree.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use pharmarx_core::types::CustomerPurchaseRecord;

/// Repository for customer purchase history.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Creates a new HistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// Appends sale lines to a customer's history.
    pub async fn append(
        &self,
        conn: &mut SqliteConnection,
        records: &[CustomerPurchaseRecord],
    ) -> DbResult<()> {
        for record in records {
            sqlx::query(
                "INSERT INTO customer_purchase_history (
                    id, owner_email, gst_number, party_name, invoice_number,
                    item_name, batch, quantity, mrp_cents, net_cents, sold_on, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )
            .bind(&record.id)
            .bind(&record.owner_email)
            .bind(&record.gst_number)
            .bind(&record.party_name)
            .bind(&record.invoice_number)
            .bind(&record.item_name)
            .bind(&record.batch)
            .bind(record.quantity)
            .bind(record.mrp_cents)
            .bind(record.net_cents)
            .bind(record.sold_on)
            .bind(record.created_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Everything one customer has bought from this owner, newest first.
    pub async fn for_customer(
        &self,
        owner_email: &str,
        gst_number: &str,
    ) -> DbResult<Vec<CustomerPurchaseRecord>> {
        let records = sqlx::query_as::<_, CustomerPurchaseRecord>(
            "SELECT id, owner_email, gst_number, party_name, invoice_number,
                    item_name, batch, quantity, mrp_cents, net_cents, sold_on, created_at
             FROM customer_purchase_history
             WHERE owner_email = ?1 AND gst_number = ?2 COLLATE NOCASE
             ORDER BY sold_on DESC, created_at DESC",
        )
        .bind(owner_email)
        .bind(gst_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
