use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_RX_DELAY_MS: u64 = 20;

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShdlcConfig {
    /// Time the device needs between receiving a request and having its
    /// response ready.
    pub rx_delay_ms: u64,
}

impl ShdlcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rx_delay(mut self, delay: Duration) -> Self {
        self.rx_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn set_rx_delay_ms(&mut self, ms: u64) {
        self.rx_delay_ms = ms;
    }

    pub fn rx_delay(&self) -> Duration {
        Duration::from_millis(self.rx_delay_ms)
    }
}

impl Default for ShdlcConfig {
    fn default() -> Self {
        Self { rx_delay_ms: DEFAULT_RX_DELAY_MS }
    }
}
