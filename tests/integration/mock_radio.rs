//! Mock adapters for integration tests.
//!
//! Records every radio call so tests can assert on the full bring-up and
//! transmit history without a transceiver attached.

use std::cell::Cell;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use forestlink::app::events::DiagnosticEvent;
use forestlink::app::ports::{Clock, DiagnosticSink};
use forestlink::link::radio::{Radio, ReceivedPacket};

// ── Radio call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    Begin,
    Transmit(Vec<u8>),
    Receive,
}

// ── MockRadio ─────────────────────────────────────────────────

/// Radio whose `begin` outcomes are scripted up front.  Once the script
/// runs out, `begin` keeps returning the last scripted outcome.
pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    begin_script: VecDeque<bool>,
    last_begin: bool,
    pub inbox: VecDeque<ReceivedPacket>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new(begin_script: &[bool]) -> Self {
        Self {
            calls: Vec::new(),
            begin_script: begin_script.iter().copied().collect(),
            last_begin: true,
            inbox: VecDeque::new(),
        }
    }

    pub fn always_failing() -> Self {
        let mut radio = Self::new(&[]);
        radio.last_begin = false;
        radio
    }

    pub fn begin_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == RadioCall::Begin).count()
    }

    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Transmit(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn deliver(&mut self, payload: &[u8], rssi: i16, snr: f32) {
        let packet = ReceivedPacket::new(payload, rssi, snr).expect("payload fits one packet");
        self.inbox.push_back(packet);
    }
}

impl Radio for MockRadio {
    type Error = &'static str;

    fn begin(&mut self) -> Result<(), &'static str> {
        self.calls.push(RadioCall::Begin);
        let ok = self.begin_script.pop_front().unwrap_or(self.last_begin);
        if ok { Ok(()) } else { Err("no response") }
    }

    fn transmit(&mut self, payload: &[u8]) -> Result<(), &'static str> {
        self.calls.push(RadioCall::Transmit(payload.to_vec()));
        Ok(())
    }

    fn receive(&mut self) -> Option<ReceivedPacket> {
        self.calls.push(RadioCall::Receive);
        self.inbox.pop_front()
    }
}

// ── Diagnostics ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<DiagnosticEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&DiagnosticEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, event: &DiagnosticEvent) {
        self.events.push(event.clone());
    }
}

// ── Time ──────────────────────────────────────────────────────

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub delays_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn advance_secs(&self, secs: u64) {
        self.now.set(self.now.get() + secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
