//! Sender relay: Producer byte stream in, one radio packet per record out.
//!
//! Each [`poll`](SenderRelay::poll) reads at most [`READ_BUDGET`] bytes
//! from the producer and stops after the first completed line, so a
//! cycle transmits at most one packet.  The producer is never blocked:
//! overlong lines are truncated and the relay keeps reading.
//!
//! Records that fail to decode are dropped here; the sender never puts
//! a record on the air that it could not validate itself.

use log::debug;

use crate::app::events::{DiagnosticEvent, Stage};
use crate::app::ports::DiagnosticSink;
use crate::link::LinkAdapter;
use crate::link::radio::Radio;
use crate::link::transport::Transport;
use crate::telemetry::codec;

use super::line::LineAccumulator;

/// Bytes consumed from the producer per cycle, at most.
pub const READ_BUDGET: usize = 64;

/// Running counters.  Dropped and truncated lines are both counted so an
/// operator can tell a quiet detector from a lossy one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Non-empty lines dispatched.
    pub lines: u32,
    /// Records handed to the radio successfully.
    pub sent: u32,
    /// Lines rejected by the decoder.
    pub dropped: u32,
    /// Lines cut at the cap.
    pub truncated: u32,
    /// Records the radio refused.
    pub transmit_failures: u32,
}

pub struct SenderRelay {
    line: LineAccumulator,
    stats: SenderStats,
}

impl SenderRelay {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            line: LineAccumulator::new(max_line_len),
            stats: SenderStats::default(),
        }
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    /// One cooperative cycle.  Returns the number of bytes consumed.
    pub fn poll<T, R>(
        &mut self,
        input: &mut T,
        link: &mut LinkAdapter<R>,
        sink: &mut impl DiagnosticSink,
    ) -> Result<usize, T::Error>
    where
        T: Transport,
        R: Radio,
    {
        let mut byte = [0u8; 1];
        let mut consumed = 0;
        while consumed < READ_BUDGET {
            if input.read(&mut byte)? == 0 {
                break;
            }
            consumed += 1;
            if self.line.push(byte[0]) {
                self.dispatch(link, sink);
                break;
            }
        }
        Ok(consumed)
    }

    /// End of producer input: a trailing line without terminator is
    /// dispatched like any other.
    pub fn finish<R: Radio>(&mut self, link: &mut LinkAdapter<R>, sink: &mut impl DiagnosticSink) {
        if self.line.finish() {
            self.dispatch(link, sink);
        }
    }

    fn dispatch<R: Radio>(&mut self, link: &mut LinkAdapter<R>, sink: &mut impl DiagnosticSink) {
        let bytes = self.line.line();
        if bytes.is_empty() {
            self.line.reset();
            return;
        }
        self.stats.lines += 1;

        let cap = self.line.cap();
        let truncated = self.line.is_truncated();
        if truncated {
            self.stats.truncated += 1;
            debug!("TRUNC | producer line cut at {cap} bytes");
            sink.emit(&DiagnosticEvent::LineTruncated {
                stage: Stage::Sender,
                cap,
            });
        }

        let decoded = if truncated {
            codec::decode_truncated(bytes, cap)
        } else {
            codec::decode_with_cap(bytes, cap)
        };
        let record = match decoded {
            Ok(record) => record,
            Err(e) => {
                self.stats.dropped += 1;
                debug!("DROP | sender: {e}");
                sink.emit(&DiagnosticEvent::RecordDropped {
                    stage: Stage::Sender,
                    error: e,
                });
                self.line.reset();
                return;
            }
        };

        // A truncated record goes out exactly as cut, without the newline
        // that ends every canonical line.
        let canonical;
        let payload: &[u8] = if truncated {
            bytes
        } else {
            canonical = codec::encode(&record);
            canonical.as_bytes()
        };

        match link.send(payload) {
            Ok(()) => {
                self.stats.sent += 1;
                debug!("TX | {} ({} bytes)", record.event_type(), payload.len());
            }
            Err(e) => {
                self.stats.transmit_failures += 1;
                debug!("TX | {e}");
                sink.emit(&DiagnosticEvent::TransmitFailed(e));
            }
        }
        self.line.reset();
    }
}
