use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and retry settings of the synchronization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Quiet period before a burst of mutations is synced
    pub debounce_ms: u64,

    /// How long to wait for the host to acknowledge a snapshot
    pub ack_timeout_ms: u64,

    /// Retries after the initial attempt before giving up
    pub max_retries: u32,

    /// First retry delay; doubles with every attempt
    pub backoff_base_ms: u64,

    /// Upper bound on a single retry delay
    pub backoff_max_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            ack_timeout_ms: 2000,
            max_retries: 3,
            backoff_base_ms: 100,
            backoff_max_ms: 5000,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}
