use std::time::Duration;

use accrual_client::{Settlement, SettlementResult};
use log::*;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use super::{
    config::TrackerConfig,
    intake::OrderIntake,
    shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger},
    working_set::WorkingSet,
};
use crate::{
    db_types::{OrderNumber, SettlementUpdate},
    traits::{ReconciliationStore, SettlementApplied, SettlementSource},
};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Builds and starts the reconciliation loop.
///
/// Create one with [`OrderTracker::new`], hand out [`OrderIntake`]s to whoever submits orders, then call
/// [`OrderTracker::start`].
pub struct OrderTracker<B, S> {
    store: B,
    source: S,
    config: TrackerConfig,
    intake: OrderIntake,
    receiver: mpsc::Receiver<OrderNumber>,
}

impl<B, S> OrderTracker<B, S>
where
    B: ReconciliationStore,
    S: SettlementSource,
{
    pub fn new(store: B, source: S, config: TrackerConfig) -> Self {
        let (intake, receiver) = OrderIntake::channel(config.intake_capacity);
        Self { store, source, config, intake, receiver }
    }

    pub fn intake(&self) -> OrderIntake {
        self.intake.clone()
    }

    /// Spawns the reconciliation loop onto the current tokio runtime.
    pub fn start(self) -> TrackerHandle {
        self.spawn(None)
    }

    /// Like [`Self::start`], but the loop also stops when `parent` fires.
    pub fn start_with_parent(self, parent: ShutdownSignal) -> TrackerHandle {
        self.spawn(Some(parent))
    }

    fn spawn(self, parent: Option<ShutdownSignal>) -> TrackerHandle {
        let (trigger, stop) = shutdown_channel();
        let Self { store, source, mut config, intake, receiver } = self;
        // tokio intervals cannot have a zero period
        config.tick_interval = config.tick_interval.max(MIN_INTERVAL);
        config.rescan_interval = config.rescan_interval.max(MIN_INTERVAL);
        // Only external intakes keep the channel open from here on
        drop(intake);
        let worker = ReconciliationLoop {
            store,
            source,
            config,
            receiver,
            working_set: WorkingSet::new(),
            cancellation: Cancellation { stop, parent },
        };
        let task = tokio::spawn(worker.run());
        TrackerHandle { trigger, task }
    }
}

/// Controls a running reconciliation loop. Dropping the handle stops the loop as well.
pub struct TrackerHandle {
    trigger: ShutdownTrigger,
    task: JoinHandle<Vec<OrderNumber>>,
}

impl TrackerHandle {
    /// Stops the loop and waits for it to exit. A settlement query that is in flight is allowed to finish, but no new
    /// one is started.
    ///
    /// Returns the orders that were still pending when the loop stopped. They remain pending in the database and are
    /// picked up by the initial re-scan the next time a tracker starts.
    pub async fn stop(self) -> Vec<OrderNumber> {
        self.trigger.trigger();
        match self.task.await {
            Ok(pending) => pending,
            Err(e) => {
                error!("🔄️ The order tracker did not shut down cleanly. {e}");
                vec![]
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// The explicit stop request, and optionally the lifecycle signal of whatever owns the tracker.
struct Cancellation {
    stop: ShutdownSignal,
    parent: Option<ShutdownSignal>,
}

impl Cancellation {
    fn is_cancelled(&self) -> bool {
        self.stop.is_triggered() || self.parent.as_ref().is_some_and(|p| p.is_triggered())
    }

    async fn cancelled(&mut self) {
        match &mut self.parent {
            Some(parent) => tokio::select! {
                _ = self.stop.triggered() => {},
                _ = parent.triggered() => {},
            },
            None => self.stop.triggered().await,
        }
    }
}

enum LoopEvent {
    Shutdown,
    Rescan,
    Enqueued(OrderNumber),
    Tick,
}

enum TickOutcome {
    Completed,
    RateLimited(Duration),
    Cancelled,
}

struct ReconciliationLoop<B, S> {
    store: B,
    source: S,
    config: TrackerConfig,
    receiver: mpsc::Receiver<OrderNumber>,
    working_set: WorkingSet,
    cancellation: Cancellation,
}

impl<B, S> ReconciliationLoop<B, S>
where
    B: ReconciliationStore,
    S: SettlementSource,
{
    async fn run(mut self) -> Vec<OrderNumber> {
        info!("🔄️ Order tracker started");
        let mut ticker = time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first re-scan fires immediately, which recovers everything left pending by a previous run
        let mut rescan = time::interval(self.config.rescan_interval);
        rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => LoopEvent::Shutdown,
                _ = rescan.tick() => LoopEvent::Rescan,
                Some(number) = self.receiver.recv() => LoopEvent::Enqueued(number),
                _ = ticker.tick() => LoopEvent::Tick,
            };
            match event {
                LoopEvent::Shutdown => break,
                LoopEvent::Rescan => {
                    self.rescan().await;
                    // Count the period from the end of the re-scan, so a slow re-scan cannot starve the other events
                    rescan.reset();
                },
                LoopEvent::Enqueued(number) => {
                    if self.working_set.track(number.clone()) {
                        trace!("🔄️ Order [{number}] is now being tracked");
                    }
                },
                LoopEvent::Tick => match self.poll_due_orders().await {
                    TickOutcome::Completed => {},
                    TickOutcome::Cancelled => break,
                    TickOutcome::RateLimited(retry_after) => {
                        if !self.back_off(retry_after).await {
                            break;
                        }
                    },
                },
            }
        }
        let pending = self.working_set.drain();
        info!("🔄️ Order tracker stopped. {} orders are still awaiting settlement", pending.len());
        pending
    }

    /// Adds every pending order in the database to the working set.
    async fn rescan(&mut self) {
        match self.store.fetch_pending_orders().await {
            Ok(orders) => {
                let found = orders.into_iter().filter(|o| self.working_set.track(o.number.clone())).count();
                if found > 0 {
                    info!("🔄️ Re-scan found {found} pending orders that were not being tracked");
                }
                trace!("🔄️ Re-scan complete. {} orders are being tracked", self.working_set.len());
            },
            Err(e) => warn!("🔄️ Could not re-scan for pending orders. {e}"),
        }
    }

    /// Queries the accrual system for every order that is due, one at a time.
    async fn poll_due_orders(&mut self) -> TickOutcome {
        let due = self.working_set.due(Instant::now(), self.config.recheck_interval);
        if due.is_empty() {
            return TickOutcome::Completed;
        }
        trace!("🔄️ {} of {} tracked orders are due for a settlement check", due.len(), self.working_set.len());
        for number in due {
            if self.cancellation.is_cancelled() {
                return TickOutcome::Cancelled;
            }
            match self.source.fetch_settlement(number.as_str()).await {
                SettlementResult::Settled(settlement) => self.apply_settlement(number, settlement).await,
                SettlementResult::Unknown => {
                    debug!("🔄️ The accrual system has no information on order [{number}] yet");
                    self.working_set.mark_checked(&number, Instant::now());
                },
                SettlementResult::RateLimited { retry_after } => {
                    info!(
                        "🔄️ Rate limited by the accrual system. Pausing all checks for {}s",
                        retry_after.as_secs_f32()
                    );
                    return TickOutcome::RateLimited(retry_after);
                },
                SettlementResult::Fatal(e) => {
                    warn!("🔄️ Settlement check for order [{number}] failed. It will be retried. {e}");
                    self.working_set.mark_checked(&number, Instant::now());
                },
            }
        }
        TickOutcome::Completed
    }

    async fn apply_settlement(&mut self, number: OrderNumber, settlement: Settlement) {
        let update = SettlementUpdate::new(number.clone(), settlement.status.into(), settlement.reward());
        match self.store.apply_settlement(update).await {
            Ok(applied) => {
                match &applied {
                    SettlementApplied::Updated { order, credited: Some(reward) } => info!(
                        "🔄️ Order [{number}] is {}. {reward} points credited to user #{}",
                        order.status, order.user_id
                    ),
                    SettlementApplied::Updated { order, credited: None } => {
                        info!("🔄️ Order [{number}] is {}", order.status)
                    },
                    SettlementApplied::Unchanged(order) => trace!(
                        "🔄️ Order [{number}] is still {} (the accrual system says {})",
                        order.status, settlement.status
                    ),
                    SettlementApplied::NotFound => {
                        warn!("🔄️ Order [{number}] is not in the database. It will not be tracked")
                    },
                }
                if applied.is_final() {
                    self.working_set.retire(&number);
                    debug!("🔄️ Order [{number}] retired from the working set");
                } else {
                    self.working_set.mark_checked(&number, Instant::now());
                }
            },
            Err(e) if e.is_retryable() => {
                error!("🔄️ Could not apply the settlement for order [{number}]. It will be retried. {e}");
                self.working_set.mark_checked(&number, Instant::now());
            },
            Err(e) => {
                error!(
                    "🔄️ The settlement for order [{number}] cannot be applied. The order stays pending, but will not be \
                     checked again until the tracker restarts. {e}"
                );
                self.working_set.set_aside(&number);
            },
        }
    }

    /// Waits out a rate limit. Returns `false` if the loop was cancelled in the meantime.
    async fn back_off(&mut self, retry_after: Duration) -> bool {
        tokio::select! {
            _ = self.cancellation.cancelled() => false,
            _ = time::sleep(retry_after) => {
                debug!("🔄️ Resuming settlement checks");
                true
            },
        }
    }
}
