//! Manager configuration.

use std::time::Duration;

/// Configuration for the event manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// How often the change detector polls the store for mutations.
    pub poll_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ManagerConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the change-detection poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
