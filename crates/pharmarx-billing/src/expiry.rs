//! # Expiry Sweep
//!
//! Moves expired inventory into the expiry archive and sends near-expiry
//! notices.
//!
//! Each record moves in its own storage transaction (delete + snapshot
//! together), so a crash mid-sweep leaves earlier records archived and
//! later ones untouched; the next run resumes cleanly and can never
//! archive a record twice.

use chrono::{Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::{error, info};

use pharmarx_core::types::{ExpiryRecord, InventoryRecord};
use pharmarx_db::Database;

use crate::error::BillingResult;
use crate::notify::{LogNotifier, Notifier};

/// Runs the expiry sweep and near-expiry notifications.
#[derive(Debug, Clone)]
pub struct ExpirySweeper<N = LogNotifier> {
    db: Database,
    notifier: N,
    /// How far ahead the near-expiry notice looks.
    pub notice_window_days: i64,
}

impl ExpirySweeper<LogNotifier> {
    /// Creates a sweeper with the default log-only notifier.
    pub fn new(db: Database) -> Self {
        ExpirySweeper {
            db,
            notifier: LogNotifier,
            notice_window_days: 30,
        }
    }
}

impl<N: Notifier> ExpirySweeper<N> {
    /// Creates a sweeper with a custom notification channel.
    pub fn with_notifier(db: Database, notifier: N) -> Self {
        ExpirySweeper {
            db,
            notifier,
            notice_window_days: 30,
        }
    }

    /// Sweeps every inventory record that expired before `today`.
    ///
    /// Returns the archived snapshots. Records that vanish between the
    /// scan and the sweep (concurrent run, stock depleted) are skipped.
    pub async fn sweep_expired(&self, today: NaiveDate) -> BillingResult<Vec<ExpiryRecord>> {
        let expired = self.db.inventory().list_expired(today).await?;
        if expired.is_empty() {
            return Ok(Vec::new());
        }

        info!(candidates = expired.len(), "expiry sweep starting");

        let repo = self.db.expiry();
        let swept_at = Utc::now();
        let mut swept = Vec::new();

        for record in &expired {
            if let Some(snapshot) = repo.sweep_record(record, swept_at).await? {
                swept.push(snapshot);
            }
        }

        info!(swept = swept.len(), "expiry sweep finished");
        Ok(swept)
    }

    /// Notifies each owner of batches expiring within the notice window
    /// starting at `today`. Delivery failures are logged and do not abort
    /// the remaining notices.
    pub async fn notify_near_expiry(&self, today: NaiveDate) -> BillingResult<usize> {
        let until = today + Duration::days(self.notice_window_days);
        let expiring = self.db.inventory().list_expiring_between(today, until).await?;

        let mut per_owner: BTreeMap<String, Vec<InventoryRecord>> = BTreeMap::new();
        for record in expiring {
            per_owner
                .entry(record.owner_email.clone())
                .or_default()
                .push(record);
        }

        let mut notified = 0;
        for (owner, records) in &per_owner {
            match self.notifier.notify_expiring(owner, records).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    error!(owner = %owner, error = %e, "near-expiry notice failed");
                }
            }
        }

        Ok(notified)
    }

    /// Runs the sweep and the near-expiry notices once, for today.
    pub async fn run_once(&self) -> BillingResult<Vec<ExpiryRecord>> {
        let today = Utc::now().date_naive();
        let swept = self.sweep_expired(today).await?;
        self.notify_near_expiry(today).await?;
        Ok(swept)
    }

    /// Runs the sweep daily until the task is dropped. Failures are logged
    /// and the loop keeps going - a transient storage error today must not
    /// stop tomorrow's sweep.
    pub async fn run_daily(&self) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            if let Err(e) = self.run_once().await {
                error!(error = %e, "daily expiry sweep failed");
            }
        }
    }
}
