use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Interface the ARP socket binds to.
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Upper bound for a single ARP query, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DetectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_interface() -> String {
    "eth0".to_string()
}

fn default_timeout_ms() -> u64 {
    500
}
