//! Outbound diagnostic events.
//!
//! The relays and the link adapter emit these through the
//! [`DiagnosticSink`](super::ports::DiagnosticSink) port.  They travel on
//! a channel separate from telemetry so an operator can tell "no events
//! occurred" apart from "events are being lost".

use crate::error::{DecodeError, EnrichError, LinkError};
use crate::link::{LinkRole, LinkState};

/// Which pipeline stage dropped or truncated a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Producer line rejected by the sender relay.
    Sender,
    /// Radio packet rejected by the receiver relay.
    Receiver,
    /// Consumer line rejected by the hub ingest.
    Hub,
}

/// Structured diagnostic events.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// A link adapter changed state.
    LinkStateChanged {
        role: LinkRole,
        from: LinkState,
        to: LinkState,
    },

    /// One radio bring-up attempt failed.
    InitAttemptFailed {
        role: LinkRole,
        attempt: u8,
        remaining: u8,
    },

    /// A record could not be decoded and was dropped.
    RecordDropped { stage: Stage, error: DecodeError },

    /// An input line exceeded the cap and was cut.
    LineTruncated { stage: Stage, cap: usize },

    /// The sender could not hand a record to the radio.
    TransmitFailed(LinkError),

    /// A decoded packet could not be enriched.
    EnrichFailed(EnrichError),

    /// The receiver could not write a record to the consumer stream.
    ForwardFailed,

    /// Periodic receiver status summary.
    Housekeeping(HousekeepingReport),
}

/// Receiver status snapshot published on the housekeeping interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HousekeepingReport {
    pub uptime_secs: u64,
    pub link_state: LinkState,
    pub received: u32,
    pub forwarded: u32,
    pub dropped: u32,
}
