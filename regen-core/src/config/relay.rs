use std::time::Duration;

/// Default minimum time between two broadcast batches.
pub const DEFAULT_MIN_BROADCAST_INTERVAL: Duration = Duration::from_secs(15);

/// Timing of the event relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Lower bound on the time between two flushes.
    pub min_broadcast_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            min_broadcast_interval: DEFAULT_MIN_BROADCAST_INTERVAL,
        }
    }
}
