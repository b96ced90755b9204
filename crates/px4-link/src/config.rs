use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Link-level retransmission of lost MAVLink frames. This is protocol
/// housekeeping below the command boundary: a request that never gets an
/// answer is re-sent, a request that is rejected is not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    pub request_timeout_ms: u64,
    pub item_timeout_ms: u64,
    pub max_retries: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            request_timeout_ms: 1500,
            item_timeout_ms: 250,
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub gcs_system_id: u8,
    pub gcs_component_id: u8,
    pub retry_policy: RetryPolicy,
    pub command_buffer_size: usize,
    pub reached_buffer_size: usize,
    /// Upper bound on waiting for the first HEARTBEAT in `Vehicle::connect`.
    /// `None` waits forever, which is the default: the autopilot may still be
    /// booting when the link comes up.
    pub connect_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            gcs_system_id: 255,
            gcs_component_id: 190,
            retry_policy: RetryPolicy::default(),
            command_buffer_size: 32,
            reached_buffer_size: 64,
            connect_timeout: None,
        }
    }
}
