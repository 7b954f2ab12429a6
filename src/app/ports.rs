//! Port traits: The hexagonal boundary between relay logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ relays / link adapter (domain)
//! ```
//!
//! The byte-oriented [`Transport`](crate::link::transport::Transport) and
//! packet-oriented [`Radio`](crate::link::radio::Radio) ports live next
//! to the link adapter; the ports here cover diagnostics, time and the
//! operator-visible status indicator.

use super::events::DiagnosticEvent;

// ───────────────────────────────────────────────────────────────
// Diagnostic sink (domain → logging / operator)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`DiagnosticEvent`]s through this port.
/// Adapters decide where they go (serial log, status characteristic, …).
pub trait DiagnosticSink {
    fn emit(&mut self, event: &DiagnosticEvent);
}

/// Collects events in memory.
impl DiagnosticSink for Vec<DiagnosticEvent> {
    fn emit(&mut self, event: &DiagnosticEvent) {
        self.push(event.clone());
    }
}

// ───────────────────────────────────────────────────────────────
// Clock (monotonic time)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock used for housekeeping intervals.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin (boot).
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Status indicator (domain → LED / buzzer)
// ───────────────────────────────────────────────────────────────

/// A single on/off output the operator can see, e.g. the node's LED.
pub trait IndicatorPort {
    fn set_level(&mut self, on: bool);
}
