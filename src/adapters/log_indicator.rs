//! Indicator adapter for hosts without an LED.
//!
//! Implements [`IndicatorPort`] by logging level changes only, so a
//! flashing pattern does not flood the log.

use log::debug;

use crate::app::ports::IndicatorPort;

#[derive(Debug, Default)]
pub struct LogIndicator {
    level: bool,
    toggles: u32,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// Number of level changes seen.
    pub fn toggles(&self) -> u32 {
        self.toggles
    }
}

impl IndicatorPort for LogIndicator {
    fn set_level(&mut self, on: bool) {
        if on != self.level {
            self.level = on;
            self.toggles += 1;
            debug!("LED | {}", if on { "on" } else { "off" });
        }
    }
}
