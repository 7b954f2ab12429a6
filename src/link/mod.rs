//! Link adapter: Bounded-retry bring-up plus non-blocking send/receive.
//!
//! ```text
//!   Uninitialized ──initialize──▶ Initializing ──begin ok──▶ Ready
//!                                      │
//!                                      └── retries exhausted ──▶ Failed (terminal)
//! ```
//!
//! Both relay roles use the same adapter; the [`LinkRole`] tag only
//! labels diagnostics.  Retries use a fixed delay, and a `Failed` adapter
//! never re-initializes on its own: the operator sees the fault
//! indicator instead of a crash loop.

pub mod radio;
pub mod sim;
pub mod transport;

use embedded_hal::delay::DelayNs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app::events::DiagnosticEvent;
use crate::app::ports::DiagnosticSink;
use crate::error::LinkError;
use radio::{MAX_PACKET_LEN, Radio, ReceivedPacket};

// ───────────────────────────────────────────────────────────────
// State
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl LinkState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl core::fmt::Display for LinkState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    Sender,
    Receiver,
}

impl core::fmt::Display for LinkRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Receiver => f.write_str("receiver"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration
// ───────────────────────────────────────────────────────────────

/// Radio bring-up policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Total `begin` attempts before the adapter gives up.
    pub max_retries: u8,
    /// Fixed delay between attempts.
    pub retry_delay_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_ms: 1000,
        }
    }
}

/// Per-adapter runtime state.  Owned by exactly one [`LinkAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSession {
    pub state: LinkState,
    pub attempts_remaining: u8,
    pub backoff_delay_ms: u32,
}

impl LinkSession {
    fn new() -> Self {
        let defaults = LinkConfig::default();
        Self {
            state: LinkState::Uninitialized,
            attempts_remaining: defaults.max_retries,
            backoff_delay_ms: defaults.retry_delay_ms,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct LinkAdapter<R: Radio> {
    radio: R,
    role: LinkRole,
    session: LinkSession,
}

impl<R: Radio> LinkAdapter<R> {
    pub fn new(radio: R, role: LinkRole) -> Self {
        Self {
            radio,
            role,
            session: LinkSession::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.session.state
    }

    pub fn session(&self) -> &LinkSession {
        &self.session
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn is_ready(&self) -> bool {
        self.session.state == LinkState::Ready
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Bring the radio up, retrying with a fixed delay.
    ///
    /// Blocks for at most `(max_retries - 1) × retry_delay_ms`.  Only
    /// called at start-up.
    pub fn initialize(
        &mut self,
        config: &LinkConfig,
        delay: &mut impl DelayNs,
        sink: &mut impl DiagnosticSink,
    ) -> Result<(), LinkError> {
        match self.session.state {
            LinkState::Ready => return Ok(()),
            LinkState::Failed => return Err(LinkError::InitFailed),
            LinkState::Uninitialized | LinkState::Initializing => {}
        }

        self.session.attempts_remaining = config.max_retries;
        self.session.backoff_delay_ms = config.retry_delay_ms;
        self.transition(LinkState::Initializing, sink);

        let mut attempt: u8 = 0;
        while self.session.attempts_remaining > 0 {
            if attempt > 0 {
                delay.delay_ms(self.session.backoff_delay_ms);
            }
            attempt += 1;
            self.session.attempts_remaining -= 1;

            match self.radio.begin() {
                Ok(()) => {
                    info!("LINK | {} radio up after {attempt} attempt(s)", self.role);
                    self.transition(LinkState::Ready, sink);
                    return Ok(());
                }
                Err(e) => {
                    debug!(
                        "LINK | {} radio init attempt {attempt} failed: {e:?} ({} left)",
                        self.role, self.session.attempts_remaining
                    );
                    sink.emit(&DiagnosticEvent::InitAttemptFailed {
                        role: self.role,
                        attempt,
                        remaining: self.session.attempts_remaining,
                    });
                }
            }
        }

        self.transition(LinkState::Failed, sink);
        Err(LinkError::InitFailed)
    }

    /// Transmit one packet.  A failed transmit leaves the state alone.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if !self.is_ready() {
            return Err(LinkError::NotReady);
        }
        if payload.len() > MAX_PACKET_LEN {
            return Err(LinkError::TransmitFailed);
        }
        self.radio.transmit(payload).map_err(|e| {
            debug!("LINK | {} transmit error: {e:?}", self.role);
            LinkError::TransmitFailed
        })
    }

    /// Take the radio's pending packet, if any.  Non-blocking.
    pub fn poll_receive(&mut self) -> Result<Option<ReceivedPacket>, LinkError> {
        if !self.is_ready() {
            return Err(LinkError::NotReady);
        }
        Ok(self.radio.receive())
    }

    fn transition(&mut self, to: LinkState, sink: &mut impl DiagnosticSink) {
        let from = self.session.state;
        if from == to {
            return;
        }
        self.session.state = to;
        sink.emit(&DiagnosticEvent::LinkStateChanged {
            role: self.role,
            from,
            to,
        });
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
