//! # Order reconciliation
//!
//! The tracker owns the set of orders whose settlement is still outstanding, and drives them to a terminal status by
//! polling the accrual system.
//!
//! * Submitted orders arrive through an [`OrderIntake`]. Enqueueing never blocks: if the intake is full the order is
//!   dropped with a warning, and picked up again by the periodic re-scan of all pending orders in the database.
//! * On every tick, each tracked order that has not been checked within the re-check interval is queried, one at a time.
//! * A rate-limit response pauses *all* polling for the signalled duration.
//! * Definitive answers are applied through [`ReconciliationStore::apply_settlement`], which updates the status and
//!   credits any reward in one transaction. The order is then retired from the working set.
//!
//! The working set lives inside the tracker's task and is never shared. [`OrderTracker::start`] spawns that task and
//! returns a [`TrackerHandle`] to stop it.
//!
//! [`ReconciliationStore::apply_settlement`]: crate::traits::ReconciliationStore::apply_settlement
mod config;
mod intake;
mod order_tracker;
mod shutdown;
mod working_set;

pub use config::TrackerConfig;
pub use intake::OrderIntake;
pub use order_tracker::{OrderTracker, TrackerHandle};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use working_set::WorkingSet;
