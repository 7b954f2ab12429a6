//! Relay configuration parameters
//!
//! All tunable parameters for a relay node or hub.
//! Values can be overridden from a JSON file passed to the binary.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::link::LinkConfig;
use crate::telemetry::codec::MAX_LINE_LEN;

/// Link quality stamped on packets by the simulated radio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// dBm
    pub rssi: i16,
    /// dB
    pub snr: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rssi: -45,
            snr: 8.5,
        }
    }
}

/// Core relay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    // --- Framing ---
    /// Producer lines longer than this are truncated (bytes)
    pub max_line_len: usize,

    // --- Radio ---
    pub link: LinkConfig,

    // --- Store ---
    /// Records kept for replay to new observers
    pub history_capacity: usize,

    // --- Timing ---
    /// Receiver status summary interval (seconds)
    pub housekeeping_interval_secs: u32,
    /// Idle sleep between poll cycles (milliseconds)
    pub poll_interval_ms: u32,

    // --- Bench ---
    pub sim: SimConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            // Framing
            max_line_len: MAX_LINE_LEN,

            // Radio
            link: LinkConfig::default(), // 5 attempts, 1 s apart

            // Store
            history_capacity: 20,

            // Timing
            housekeeping_interval_secs: 30,
            poll_interval_ms: 10, // 100 Hz

            sim: SimConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.max_line_len == 0 || self.max_line_len > MAX_LINE_LEN {
            return Err(Error::Config("max_line_len must be 1..=255"));
        }
        if self.link.max_retries == 0 {
            return Err(Error::Config("link.max_retries must be at least 1"));
        }
        if self.history_capacity == 0 {
            return Err(Error::Config("history_capacity must be at least 1"));
        }
        if self.housekeeping_interval_secs == 0 {
            return Err(Error::Config("housekeeping_interval_secs must be at least 1"));
        }
        if !self.sim.snr.is_finite() {
            return Err(Error::Config("sim.snr must be finite"));
        }
        Ok(())
    }
}
