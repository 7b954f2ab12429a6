//! Hub ingest: Feeds the event store from a receiver's consumer stream.
//!
//! The central hub sits on the far end of the receiver's serial line.
//! Only `DATA:` lines carry telemetry; everything else (housekeeping,
//! boot chatter) is skipped.  A `DATA:` line too long for a frame was
//! damaged on the way and is not ingested.  Records are stamped with the
//! hub's own arrival time.

use log::debug;

use crate::app::events::{DiagnosticEvent, Stage};
use crate::app::ports::{Clock, DiagnosticSink};
use crate::link::transport::Transport;
use crate::relay::line::LineAccumulator;
use crate::relay::receiver::{DATA_PREFIX, FRAME_CAPACITY};
use crate::store::EventStore;
use crate::telemetry::codec;

/// Bytes consumed per cycle, at most.
pub const READ_BUDGET: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Non-empty lines seen.
    pub lines: u32,
    /// Records appended to the store.
    pub ingested: u32,
    /// Lines without the telemetry prefix.
    pub ignored: u32,
    /// Telemetry lines that failed to decode.
    pub dropped: u32,
    /// Telemetry lines longer than a frame.
    pub truncated: u32,
}

pub struct HubIngest {
    line: LineAccumulator<FRAME_CAPACITY>,
    stats: HubStats,
}

impl Default for HubIngest {
    fn default() -> Self {
        Self::new()
    }
}

impl HubIngest {
    pub fn new() -> Self {
        Self {
            line: LineAccumulator::new(FRAME_CAPACITY),
            stats: HubStats::default(),
        }
    }

    pub fn stats(&self) -> HubStats {
        self.stats
    }

    /// One cycle.  Returns the number of bytes consumed.
    pub fn poll<T: Transport>(
        &mut self,
        input: &mut T,
        store: &EventStore,
        clock: &impl Clock,
        sink: &mut impl DiagnosticSink,
    ) -> Result<usize, T::Error> {
        let mut buf = [0u8; READ_BUDGET];
        let n = input.read(&mut buf)?;
        for &byte in &buf[..n] {
            if self.line.push(byte) {
                self.ingest(store, clock, sink);
            }
        }
        Ok(n)
    }

    /// End of input: ingest a trailing unterminated line.
    pub fn finish(
        &mut self,
        store: &EventStore,
        clock: &impl Clock,
        sink: &mut impl DiagnosticSink,
    ) {
        if self.line.finish() {
            self.ingest(store, clock, sink);
        }
    }

    fn ingest(&mut self, store: &EventStore, clock: &impl Clock, sink: &mut impl DiagnosticSink) {
        self.stats.lines += 1;
        let line = self.line.line();

        let Some(payload) = line.strip_prefix(DATA_PREFIX.as_bytes()) else {
            self.stats.ignored += 1;
            debug!("HUB | {}", String::from_utf8_lossy(line));
            self.line.reset();
            return;
        };

        if self.line.is_truncated() {
            self.stats.truncated += 1;
            let cap = self.line.cap();
            debug!("TRUNC | hub: DATA line over {cap} bytes discarded");
            sink.emit(&DiagnosticEvent::LineTruncated {
                stage: Stage::Hub,
                cap,
            });
            self.line.reset();
            return;
        }

        match codec::decode(payload) {
            Ok(record) => {
                self.stats.ingested += 1;
                store.append(record, clock.now_ms());
            }
            Err(e) => {
                self.stats.dropped += 1;
                debug!("DROP | hub: {e}");
                sink.emit(&DiagnosticEvent::RecordDropped {
                    stage: Stage::Hub,
                    error: e,
                });
            }
        }
        self.line.reset();
    }
}
