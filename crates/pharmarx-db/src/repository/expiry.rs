//! # Expiry Repository
//!
//! Moves expired inventory records into the expiry_records snapshot table.
//!
//! ## Sweep Atomicity
//! Each record is swept in its own transaction:
//!
//! ```text
//! BEGIN
//!   DELETE FROM inventory WHERE id = ?      ── 0 rows ⇒ already swept, skip
//!   INSERT INTO expiry_records (…snapshot…)
//! COMMIT
//! ```
//!
//! A crash between records leaves earlier sweeps committed and later ones
//! untouched; the next run picks up exactly where the last one stopped.
//! Sweeping the same record twice is impossible because the second DELETE
//! finds nothing.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::generate_id;
use pharmarx_core::types::{ExpiryRecord, InventoryRecord};

/// Repository for expiry sweep snapshots.
#[derive(Debug, Clone)]
pub struct ExpiryRepository {
    pool: SqlitePool,
}

impl ExpiryRepository {
    /// Creates a new ExpiryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpiryRepository { pool }
    }

    /// Sweeps one expired inventory record: deletes it from inventory and
    /// writes its snapshot, atomically.
    ///
    /// Returns `Ok(None)` if the record has no expiry date or was already
    /// removed (swept by a concurrent run, or depleted and deleted).
    pub async fn sweep_record(
        &self,
        record: &InventoryRecord,
        swept_at: DateTime<Utc>,
    ) -> DbResult<Option<ExpiryRecord>> {
        let Some(expiry_date) = record.expiry_date else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM inventory WHERE id = ?1")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            // Gone already - dropping the transaction rolls back.
            debug!(id = %record.id, "inventory record already removed, skipping sweep");
            return Ok(None);
        }

        let snapshot = ExpiryRecord {
            id: generate_id(),
            owner_email: record.owner_email.clone(),
            item_name: record.item_name.clone(),
            batch: record.batch.clone(),
            quantity: record.quantity,
            purchase_rate_cents: record.purchase_rate_cents,
            mrp_cents: record.mrp_cents,
            gst_bps: record.gst_bps,
            expiry_date,
            pack: record.pack.clone(),
            description: record.description.clone(),
            swept_at,
        };

        sqlx::query(
            "INSERT INTO expiry_records (
                id, owner_email, item_name, batch, quantity,
                purchase_rate_cents, mrp_cents, gst_bps, expiry_date,
                pack, description, swept_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&snapshot.id)
        .bind(&snapshot.owner_email)
        .bind(&snapshot.item_name)
        .bind(&snapshot.batch)
        .bind(snapshot.quantity)
        .bind(snapshot.purchase_rate_cents)
        .bind(snapshot.mrp_cents)
        .bind(snapshot.gst_bps)
        .bind(snapshot.expiry_date)
        .bind(&snapshot.pack)
        .bind(&snapshot.description)
        .bind(snapshot.swept_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            owner = %snapshot.owner_email,
            item = %snapshot.item_name,
            batch = %snapshot.batch,
            quantity = snapshot.quantity,
            "swept expired inventory record"
        );

        Ok(Some(snapshot))
    }

    /// Lists swept records for an owner, most recently swept first.
    pub async fn list_for_owner(&self, owner_email: &str) -> DbResult<Vec<ExpiryRecord>> {
        let records = sqlx::query_as::<_, ExpiryRecord>(
            "SELECT id, owner_email, item_name, batch, quantity,
                    purchase_rate_cents, mrp_cents, gst_bps, expiry_date,
                    pack, description, swept_at
             FROM expiry_records
             WHERE owner_email = ?1
             ORDER BY swept_at DESC",
        )
        .bind(owner_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
