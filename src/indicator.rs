//! Status indicator pattern engine.
//!
//! Drives a single on/off output (the node's LED) from the link state
//! and packet activity.  The main loop calls `tick()` each cycle and
//! feeds the level into an [`IndicatorPort`].
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **Fault**: rapid flash (8 Hz), persistent once the link fails
//! 2. **Activity**: one short pulse per handled packet
//! 3. **Link state**: slow blink while initializing, solid when ready
//!
//! | Pattern    | Description              | Rate   |
//! |------------|--------------------------|--------|
//! | Solid      | Constant on              | -      |
//! | SlowBlink  | On/off square wave       | 1 Hz   |
//! | Pulse      | Single flash, then off   | 50 ms  |
//! | RapidFlash | Very fast on/off         | 8 Hz   |

use crate::app::ports::IndicatorPort;
use crate::link::LinkState;

/// Length of the activity pulse.
pub const PULSE_MS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Off,
    Solid,
    SlowBlink,
    Pulse,
    RapidFlash,
}

/// Pattern engine.  Stack-allocated, no heap.
#[derive(Debug)]
pub struct StatusIndicator {
    phase_ms: u32,
    active: Pattern,
    link: LinkState,
    fault: bool,
    pulse_remaining_ms: u32,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self {
            phase_ms: 0,
            active: Pattern::Off,
            link: LinkState::Uninitialized,
            fault: false,
            pulse_remaining_ms: 0,
        }
    }

    /// Track the link state.  `Failed` latches the fault pattern.
    pub fn set_link_state(&mut self, state: LinkState) {
        self.link = state;
        if state == LinkState::Failed {
            self.fault = true;
        }
    }

    /// Flash once for a handled packet.
    pub fn activity(&mut self) {
        self.pulse_remaining_ms = PULSE_MS;
    }

    pub fn is_fault(&self) -> bool {
        self.fault
    }

    pub fn pattern(&self) -> Pattern {
        self.active
    }

    /// Advance by `delta_ms` and return the output level.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);

        let selected = self.select();
        if selected != self.active {
            self.phase_ms = 0;
            self.active = selected;
        }

        let level = self.generate();
        self.pulse_remaining_ms = self.pulse_remaining_ms.saturating_sub(delta_ms);
        level
    }

    /// `tick` and write the level to `port`.
    pub fn drive(&mut self, delta_ms: u32, port: &mut impl IndicatorPort) {
        let level = self.tick(delta_ms);
        port.set_level(level);
    }

    fn select(&self) -> Pattern {
        if self.fault {
            return Pattern::RapidFlash;
        }
        if self.pulse_remaining_ms > 0 {
            return Pattern::Pulse;
        }
        match self.link {
            LinkState::Uninitialized => Pattern::Off,
            LinkState::Initializing => Pattern::SlowBlink,
            LinkState::Ready => Pattern::Solid,
            LinkState::Failed => Pattern::RapidFlash,
        }
    }

    fn generate(&self) -> bool {
        match self.active {
            Pattern::Off => false,
            Pattern::Solid => true,
            // Inverted against the solid "ready" level so the pulse is visible.
            Pattern::Pulse => self.link != LinkState::Ready,
            Pattern::SlowBlink => (self.phase_ms % 1000) < 500,
            Pattern::RapidFlash => (self.phase_ms % 125) < 63,
        }
    }
}
