//! Receiver relay: Radio packets in, `DATA:` lines and store appends out.
//!
//! Each cycle services the housekeeping timer, then polls the link once.
//! A packet that decodes is enriched with the link quality it arrived
//! at, re-encoded and written to the consumer as `DATA:<line>`; the same
//! record is appended to the [`EventStore`].  Housekeeping output is plain
//! text without the prefix, so a consumer can tell the two apart.

use core::fmt::Write as _;

use log::{debug, warn};

use crate::app::events::{DiagnosticEvent, HousekeepingReport, Stage};
use crate::app::ports::{Clock, DiagnosticSink};
use crate::link::LinkAdapter;
use crate::link::radio::{Radio, ReceivedPacket};
use crate::link::transport::{Transport, write_all};
use crate::store::EventStore;
use crate::telemetry::codec::{self, LINE_CAPACITY, MAX_LINE_LEN};

/// Marks telemetry lines on the consumer stream.
pub const DATA_PREFIX: &str = "DATA:";

/// Largest consumer frame: prefix plus an encoded line.
pub const FRAME_CAPACITY: usize = DATA_PREFIX.len() + LINE_CAPACITY;

type Frame = heapless::String<FRAME_CAPACITY>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Packets taken from the radio.
    pub received: u32,
    /// Records written to the consumer.
    pub forwarded: u32,
    /// Packets discarded (decode or enrich failure).
    pub dropped: u32,
    /// Consumer writes that failed.
    pub forward_failures: u32,
}

pub struct ReceiverRelay {
    stats: ReceiverStats,
    started_ms: u64,
    last_housekeeping_ms: u64,
    housekeeping_interval_ms: u64,
}

impl ReceiverRelay {
    pub fn new(housekeeping_interval_secs: u32, now_ms: u64) -> Self {
        Self {
            stats: ReceiverStats::default(),
            started_ms: now_ms,
            last_housekeeping_ms: now_ms,
            housekeeping_interval_ms: u64::from(housekeeping_interval_secs.max(1)) * 1000,
        }
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// One cooperative cycle.  Returns `true` if a packet was handled.
    pub fn poll<R, T>(
        &mut self,
        link: &mut LinkAdapter<R>,
        consumer: &mut T,
        store: &EventStore,
        clock: &impl Clock,
        sink: &mut impl DiagnosticSink,
    ) -> bool
    where
        R: Radio,
        T: Transport,
    {
        self.service_housekeeping(link, consumer, clock, sink);

        match link.poll_receive() {
            Ok(Some(packet)) => {
                self.handle_packet(&packet, consumer, store, clock, sink);
                true
            }
            // A failed link is reported once through its state change.
            Ok(None) | Err(_) => false,
        }
    }

    fn handle_packet<T: Transport>(
        &mut self,
        packet: &ReceivedPacket,
        consumer: &mut T,
        store: &EventStore,
        clock: &impl Clock,
        sink: &mut impl DiagnosticSink,
    ) {
        self.stats.received += 1;

        // Canonical lines end in '\n'; anything else was cut by the sender.
        let decoded = if packet.payload.last() == Some(&b'\n') {
            codec::decode(&packet.payload)
        } else {
            codec::decode_truncated(&packet.payload, MAX_LINE_LEN)
        };
        let record = match decoded {
            Ok(record) => record,
            Err(e) => {
                self.stats.dropped += 1;
                debug!("DROP | receiver: {e} (rssi {} dBm)", packet.rssi);
                sink.emit(&DiagnosticEvent::RecordDropped {
                    stage: Stage::Receiver,
                    error: e,
                });
                return;
            }
        };

        let enriched = match codec::enrich(&record, packet.rssi, packet.snr) {
            Ok(enriched) => enriched,
            Err(e) => {
                self.stats.dropped += 1;
                debug!("DROP | receiver: {e}");
                sink.emit(&DiagnosticEvent::EnrichFailed(e));
                return;
            }
        };

        let mut frame = Frame::new();
        let framed = frame.push_str(DATA_PREFIX).is_ok()
            && frame.push_str(&codec::encode(&enriched)).is_ok();
        if framed && write_all(consumer, frame.as_bytes()).is_ok() {
            self.stats.forwarded += 1;
        } else {
            self.stats.forward_failures += 1;
            debug!("FWD | consumer write failed");
            sink.emit(&DiagnosticEvent::ForwardFailed);
        }

        store.append(enriched, clock.now_ms());
    }

    fn service_housekeeping<R: Radio, T: Transport>(
        &mut self,
        link: &LinkAdapter<R>,
        consumer: &mut T,
        clock: &impl Clock,
        sink: &mut impl DiagnosticSink,
    ) {
        let now = clock.now_ms();
        if now.saturating_sub(self.last_housekeeping_ms) < self.housekeeping_interval_ms {
            return;
        }
        self.last_housekeeping_ms = now;

        let report = HousekeepingReport {
            uptime_secs: now.saturating_sub(self.started_ms) / 1000,
            link_state: link.state(),
            received: self.stats.received,
            forwarded: self.stats.forwarded,
            dropped: self.stats.dropped,
        };

        let mut line = heapless::String::<96>::new();
        let _ = writeln!(
            line,
            "STATUS uptime_s={} rx={} fwd={} dropped={}",
            report.uptime_secs, report.received, report.forwarded, report.dropped
        );
        if write_all(consumer, line.as_bytes()).is_err() {
            warn!("HK | status line not written");
        }
        sink.emit(&DiagnosticEvent::Housekeeping(report));
    }
}
