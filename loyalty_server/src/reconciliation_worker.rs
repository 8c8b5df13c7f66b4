use accrual_client::{AccrualApi, AccrualConfig};
use log::*;
use loyalty_engine::{LoyaltyDatabase, OrderIntake, OrderTracker, TrackerConfig, TrackerHandle};

use crate::errors::ServerError;

/// Starts the reconciliation worker, which settles submitted orders against the accrual system in the background.
///
/// Hand the returned intake to the order submission API. Call [`TrackerHandle::stop`] once the HTTP server has shut
/// down, so that in-flight settlements finish before the database closes.
pub fn start_reconciliation_worker<B: LoyaltyDatabase>(
    db: B,
    accrual: AccrualConfig,
    config: TrackerConfig,
) -> Result<(OrderIntake, TrackerHandle), ServerError> {
    info!(
        "🕰️ Starting reconciliation worker against {}. Tick: {}ms, recheck: {}ms, re-scan: {}s",
        accrual.base_url,
        config.tick_interval.as_millis(),
        config.recheck_interval.as_millis(),
        config.rescan_interval.as_secs()
    );
    let source = AccrualApi::new(accrual).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let tracker = OrderTracker::new(db, source, config);
    let intake = tracker.intake();
    let handle = tracker.start();
    Ok((intake, handle))
}

/// Stops the reconciliation worker and reports what it left behind.
pub async fn stop_reconciliation_worker(handle: TrackerHandle) {
    info!("🕰️ Stopping reconciliation worker");
    let pending = handle.stop().await;
    if pending.is_empty() {
        info!("🕰️ Reconciliation worker stopped. No orders are awaiting settlement");
    } else {
        let orders = pending.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
        info!("🕰️ Reconciliation worker stopped. {} orders will resume on the next start: {orders}", pending.len());
    }
}
