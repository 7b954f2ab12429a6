//! Log-based diagnostic sink adapter.
//!
//! Implements [`DiagnosticSink`] by writing structured diagnostic events
//! to the `log` facade (stderr under `env_logger` on the bench, the
//! serial console on a node).  Telemetry never goes through here, so the
//! consumer stream stays clean.

use log::{error, info, warn};

use crate::app::events::DiagnosticEvent;
use crate::app::ports::DiagnosticSink;
use crate::link::LinkState;

/// Adapter that logs every [`DiagnosticEvent`], and keeps a count of
/// dropped records for the end-of-run summary.
#[derive(Debug, Default)]
pub struct LogDiagnosticSink {
    dropped: u32,
}

impl LogDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records dropped at any stage so far.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl DiagnosticSink for LogDiagnosticSink {
    fn emit(&mut self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::LinkStateChanged { role, from, to } => {
                if *to == LinkState::Failed {
                    error!("LINK | {role} {from} -> {to}, radio halted; fault indicator active");
                } else {
                    info!("LINK | {role} {from} -> {to}");
                }
            }
            DiagnosticEvent::InitAttemptFailed {
                role,
                attempt,
                remaining,
            } => {
                warn!("LINK | {role} init attempt {attempt} failed, {remaining} left");
            }
            DiagnosticEvent::RecordDropped { stage, error } => {
                self.dropped += 1;
                warn!("DROP | stage={stage:?} | {error}");
            }
            DiagnosticEvent::LineTruncated { stage, cap } => {
                warn!("TRUNC | stage={stage:?} | cut at {cap} bytes");
            }
            DiagnosticEvent::TransmitFailed(e) => {
                warn!("TX | {e}");
            }
            DiagnosticEvent::EnrichFailed(e) => {
                self.dropped += 1;
                warn!("DROP | stage=Receiver | {e}");
            }
            DiagnosticEvent::ForwardFailed => {
                warn!("FWD | consumer write failed");
            }
            DiagnosticEvent::Housekeeping(r) => {
                info!(
                    "HK | uptime={}s | link={} | rx={} fwd={} dropped={}",
                    r.uptime_secs, r.link_state, r.received, r.forwarded, r.dropped
                );
            }
        }
    }
}
