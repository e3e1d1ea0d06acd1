//! # Inventory Repository
//!
//! Database operations for the one mutable table in the system.
//!
//! ## Decrement Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Never: read quantity → check in Rust → write quantity                  │
//! │         (two concurrent sales both pass the check on a stale read)      │
//! │                                                                         │
//! │  Always: UPDATE inventory                                               │
//! │          SET quantity = quantity - n                                    │
//! │          WHERE … AND quantity >= n                                      │
//! │                                                                         │
//! │          rows_affected == 0  ⇒  insufficient stock (or no record)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Item/batch/owner matching is case-insensitive via the COLLATE NOCASE
//! columns, so a plain `=` here follows the same normalization rule as the
//! in-memory reconciliation keys.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::generate_id;
use pharmarx_core::request::PurchaseLineRequest;
use pharmarx_core::types::InventoryRecord;

const SELECT_COLUMNS: &str = "id, owner_email, item_name, batch, quantity, \
     purchase_rate_cents, mrp_cents, gst_bps, expiry_date, pack, description, \
     created_at, updated_at";

/// Repository for inventory stock records.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the stock record for one (owner, item, batch) key.
    pub async fn get(
        &self,
        owner_email: &str,
        item_name: &str,
        batch: &str,
    ) -> DbResult<Option<InventoryRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM inventory
             WHERE owner_email = ?1 AND item_name = ?2 AND batch = ?3"
        );

        let record = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(owner_email)
            .bind(item_name)
            .bind(batch)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Reads the current quantity for a key inside a transaction.
    ///
    /// Used for error detail only - the decrement itself is conditional, so
    /// a stale value here can never corrupt stock.
    pub async fn quantity(
        &self,
        conn: &mut SqliteConnection,
        owner_email: &str,
        item_name: &str,
        batch: &str,
    ) -> DbResult<Option<i64>> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM inventory
             WHERE owner_email = ?1 AND item_name = ?2 AND batch = ?3",
        )
        .bind(owner_email)
        .bind(item_name)
        .bind(batch)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(quantity)
    }

    /// Applies one purchased line: creates the record on first purchase,
    /// otherwise increments the quantity and overwrites rates
    /// (last-write-wins, not averaged).
    pub async fn apply_purchase(
        &self,
        conn: &mut SqliteConnection,
        owner_email: &str,
        line: &PurchaseLineRequest,
    ) -> DbResult<()> {
        debug!(
            owner = %owner_email,
            item = %line.item_name,
            batch = %line.batch,
            quantity = line.quantity,
            "applying purchase to inventory"
        );

        let now = Utc::now();

        sqlx::query(
            "INSERT INTO inventory (
                id, owner_email, item_name, batch, quantity,
                purchase_rate_cents, mrp_cents, gst_bps, expiry_date,
                pack, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ON CONFLICT (owner_email, item_name, batch) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                purchase_rate_cents = excluded.purchase_rate_cents,
                mrp_cents = excluded.mrp_cents,
                gst_bps = excluded.gst_bps,
                expiry_date = excluded.expiry_date,
                pack = COALESCE(excluded.pack, pack),
                description = COALESCE(excluded.description, description),
                updated_at = excluded.updated_at",
        )
        .bind(generate_id())
        .bind(owner_email)
        .bind(line.item_name.trim())
        .bind(line.batch.trim())
        .bind(line.quantity)
        .bind(line.purchase_rate_cents)
        .bind(line.mrp_cents)
        .bind(line.gst_bps)
        .bind(line.expiry_date)
        .bind(&line.pack)
        .bind(&line.description)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Puts returned stock back: increments the quantity, re-creating the
    /// record if the batch was swept or never tracked. Rates are NOT
    /// overwritten - only purchases establish rates.
    #[allow(clippy::too_many_arguments)]
    pub async fn restock(
        &self,
        conn: &mut SqliteConnection,
        owner_email: &str,
        item_name: &str,
        batch: &str,
        quantity: i64,
        mrp_cents: i64,
        gst_bps: u32,
    ) -> DbResult<()> {
        debug!(
            owner = %owner_email,
            item = %item_name,
            batch = %batch,
            quantity,
            "restocking inventory from return"
        );

        let now = Utc::now();

        sqlx::query(
            "INSERT INTO inventory (
                id, owner_email, item_name, batch, quantity,
                purchase_rate_cents, mrp_cents, gst_bps, expiry_date,
                pack, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, NULL, NULL, NULL, ?8, ?8)
            ON CONFLICT (owner_email, item_name, batch) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = excluded.updated_at",
        )
        .bind(generate_id())
        .bind(owner_email)
        .bind(item_name.trim())
        .bind(batch.trim())
        .bind(quantity)
        .bind(mrp_cents)
        .bind(gst_bps)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Atomically takes `quantity` units out of stock.
    ///
    /// Returns the number of rows affected: 0 means the record is missing
    /// OR holds less than the requested quantity - the caller distinguishes
    /// the two with [`Self::quantity`] for the error message.
    pub async fn conditional_decrement(
        &self,
        conn: &mut SqliteConnection,
        owner_email: &str,
        item_name: &str,
        batch: &str,
        quantity: i64,
    ) -> DbResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE inventory
             SET quantity = quantity - ?4, updated_at = ?5
             WHERE owner_email = ?1 AND item_name = ?2 AND batch = ?3
               AND quantity >= ?4",
        )
        .bind(owner_email)
        .bind(item_name)
        .bind(batch)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists records whose batch expired strictly before the given date.
    pub async fn list_expired(&self, before: NaiveDate) -> DbResult<Vec<InventoryRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM inventory
             WHERE expiry_date IS NOT NULL AND expiry_date < ?1
             ORDER BY owner_email, item_name, batch"
        );

        let records = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(before)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Lists records expiring within `[from, until)` - the near-expiry
    /// window used for notification notices.
    pub async fn list_expiring_between(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> DbResult<Vec<InventoryRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM inventory
             WHERE expiry_date IS NOT NULL AND expiry_date >= ?1 AND expiry_date < ?2
             ORDER BY owner_email, expiry_date, item_name"
        );

        let records = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }
}
