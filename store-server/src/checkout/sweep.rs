//! Payment-timeout sweep
//!
//! Orders sit in `pending_payment` holding reserved stock. This
//! background task cancels the ones whose payment window has elapsed,
//! returning stock to the catalog through the normal cancel path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::CheckoutError;
use super::fulfillment::FulfillmentService;
use super::storage::CheckoutStorage;
use shared::util::now_millis;

pub struct PaymentTimeoutSweeper {
    storage: CheckoutStorage,
    fulfillment: FulfillmentService,
    timeout: Duration,
    interval: Duration,
    shutdown: CancellationToken,
}

impl PaymentTimeoutSweeper {
    pub fn new(
        storage: CheckoutStorage,
        fulfillment: FulfillmentService,
        timeout: Duration,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            storage,
            fulfillment,
            timeout,
            interval,
            shutdown,
        }
    }

    /// Main loop: sweep once at startup (recovers from a restart with
    /// stale orders on disk), then periodically until shutdown.
    pub async fn run(self) {
        tracing::info!(
            timeout_secs = self.timeout.as_secs(),
            interval_secs = self.interval.as_secs(),
            "payment timeout sweeper started"
        );

        loop {
            match self.sweep_once(now_millis()) {
                Ok(0) => {}
                Ok(n) => tracing::info!("swept {n} expired order(s)"),
                Err(e) => tracing::error!("payment timeout sweep failed: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("payment timeout sweeper received shutdown signal");
                    return;
                }
            }
        }
    }

    /// Cancel every tracked order whose payment deadline passed.
    /// Returns the number of orders cancelled.
    pub fn sweep_once(&self, now: i64) -> Result<usize, CheckoutError> {
        let deadline = self.timeout.as_millis() as i64;
        let mut cancelled = 0;

        for (order_id, created_at) in self.storage.list_pending()? {
            if now - created_at < deadline {
                continue;
            }
            match self.fulfillment.cancel_if_pending_payment(&order_id) {
                Ok(Some(_)) => {
                    tracing::info!(order_id = %order_id, "payment window elapsed, order cancelled");
                    cancelled += 1;
                }
                // payment landed between the listing and the cancel
                Ok(None) => {
                    self.clear_tracking(&order_id)?;
                }
                Err(e) => {
                    tracing::error!(order_id = %order_id, "sweep cancel failed: {e}");
                }
            }
        }
        Ok(cancelled)
    }

    fn clear_tracking(&self, order_id: &str) -> Result<(), CheckoutError> {
        let txn = self.storage.begin_write()?;
        self.storage.clear_pending_txn(&txn, order_id)?;
        self.storage.commit(txn)?;
        Ok(())
    }
}
