//! # Repositories
//!
//! One repository per storage concern:
//!
//! - [`inventory`] - the mutable stock table (atomic conditional decrements)
//! - [`purchase`] - purchase + purchase-return ledgers (append-only)
//! - [`sale`] - sale + sale-return ledgers (append-only)
//! - [`history`] - customer purchase history (reporting aggregate)
//! - [`expiry`] - expiry sweep snapshots
//!
//! Read methods run on the pool; write methods take a `&mut
//! SqliteConnection` so the caller decides the transaction boundary.

pub mod expiry;
pub mod history;
pub mod inventory;
pub mod purchase;
pub mod sale;

use sqlx::SqliteConnection;

use crate::error::DbResult;
use pharmarx_core::types::BillLineItem;

/// The four bill-item tables share one column layout, so a single insert
/// helper serves all of them. `table` is always one of the compile-time
/// constants below, never caller input.
pub(crate) const PURCHASE_ITEMS_TABLE: &str = "purchase_bill_items";
pub(crate) const SALE_ITEMS_TABLE: &str = "sale_bill_items";
pub(crate) const SALE_RETURN_ITEMS_TABLE: &str = "sale_return_bill_items";
pub(crate) const PURCHASE_RETURN_ITEMS_TABLE: &str = "purchase_return_bill_items";

pub(crate) async fn insert_line_items(
    conn: &mut SqliteConnection,
    table: &str,
    items: &[BillLineItem],
) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO {table} (
            id, bill_id, item_name, batch, quantity,
            purchase_rate_cents, mrp_cents, discount_bps, gst_bps, expiry_date,
            total_cents, discount_cents, gst_cents, net_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    );

    for item in items {
        sqlx::query(&sql)
            .bind(&item.id)
            .bind(&item.bill_id)
            .bind(&item.item_name)
            .bind(&item.batch)
            .bind(item.quantity)
            .bind(item.purchase_rate_cents)
            .bind(item.mrp_cents)
            .bind(item.discount_bps)
            .bind(item.gst_bps)
            .bind(item.expiry_date)
            .bind(item.totals.total_cents)
            .bind(item.totals.discount_cents)
            .bind(item.totals.gst_cents)
            .bind(item.totals.net_cents)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Generates a new row ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
