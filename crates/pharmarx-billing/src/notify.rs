//! # Expiry Notifications
//!
//! Delivery channel for near-expiry notices. The sweep treats delivery as
//! best-effort: a failed notification is logged and never blocks or rolls
//! back the sweep itself.

use std::future::Future;

use thiserror::Error;
use tracing::info;

use pharmarx_core::types::InventoryRecord;

/// Notification delivery failure.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// A channel that can deliver a near-expiry notice to one owner.
pub trait Notifier: Send + Sync {
    /// Delivers a notice listing the owner's batches that expire within the
    /// configured window.
    fn notify_expiring(
        &self,
        owner_email: &str,
        records: &[InventoryRecord],
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Default notifier: writes the notice to the log.
///
/// Deployments with a real channel (mail, SMS gateway) implement
/// [`Notifier`] themselves and hand it to the sweeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify_expiring(
        &self,
        owner_email: &str,
        records: &[InventoryRecord],
    ) -> Result<(), NotifyError> {
        for record in records {
            info!(
                owner = %owner_email,
                item = %record.item_name,
                batch = %record.batch,
                quantity = record.quantity,
                expiry = ?record.expiry_date,
                "batch nearing expiry"
            );
        }
        Ok(())
    }
}
