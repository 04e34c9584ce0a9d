//! Driver configuration

use crate::transport::ScanConfig;
use minidrone_protocol::timing;
use std::time::Duration;

/// Configuration for a drone session
#[derive(Debug, Clone)]
pub struct DroneConfig {
    /// Pause between two keepalive writes (after the previous write completes)
    pub keepalive_interval: Duration,
    /// Delay between bring-up and the first keepalive tick
    pub settle_delay: Duration,
    /// Discovery settings for the default BlueZ host
    pub scan: ScanConfig,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_millis(timing::KEEPALIVE_INTERVAL_MS),
            settle_delay: Duration::from_millis(timing::SETTLE_DELAY_MS),
            scan: ScanConfig::default(),
        }
    }
}
