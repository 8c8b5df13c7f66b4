use std::time::Duration;

use lpg_common::env_or_default;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_INTAKE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often the working set is scanned for orders that are due for a check.
    pub tick_interval: Duration,
    /// The minimum time between two settlement queries for the same order.
    pub recheck_interval: Duration,
    /// How often the database is scanned for pending orders the tracker does not know about.
    pub rescan_interval: Duration,
    /// Number of submitted orders that can wait in the intake before new submissions are dropped.
    pub intake_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
        }
    }
}

impl TrackerConfig {
    pub fn new_from_env_or_default() -> Self {
        let tick = env_or_default("LPG_TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL.as_millis() as u64);
        let recheck = env_or_default("LPG_RECHECK_INTERVAL_MS", DEFAULT_RECHECK_INTERVAL.as_millis() as u64);
        let rescan = env_or_default("LPG_RESCAN_INTERVAL_SECS", DEFAULT_RESCAN_INTERVAL.as_secs());
        let intake_capacity = env_or_default("LPG_INTAKE_CAPACITY", DEFAULT_INTAKE_CAPACITY);
        Self {
            // tokio intervals panic on a zero period
            tick_interval: Duration::from_millis(tick.max(1)),
            recheck_interval: Duration::from_millis(recheck),
            rescan_interval: Duration::from_secs(rescan.max(1)),
            intake_capacity: intake_capacity.max(1),
        }
    }
}
