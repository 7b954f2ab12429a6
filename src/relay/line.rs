//! Line accumulator: Turns a byte stream into bounded lines.
//!
//! ```text
//!   Idle ──byte──▶ Accumulating ──'\n' | '\r'──▶ Dispatching ──reset──▶ Idle
//! ```
//!
//! Bytes past the cap are discarded until the terminator arrives; the
//! line is then dispatched with its first `cap` bytes and flagged as
//! truncated.  A terminator seen while `Idle` (blank line, or the `\n` of
//! a `\r\n` pair) produces nothing.

use crate::telemetry::codec::MAX_LINE_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Idle,
    Accumulating,
    Dispatching,
}

/// Fixed-capacity line buffer.  `N` bounds the memory; the runtime cap
/// passed to [`LineAccumulator::new`] may be smaller.
#[derive(Debug)]
pub struct LineAccumulator<const N: usize = MAX_LINE_LEN> {
    buf: heapless::Vec<u8, N>,
    cap: usize,
    state: LineState,
    truncated: bool,
}

const fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

impl<const N: usize> LineAccumulator<N> {
    /// `cap` is clamped to `1..=N`.
    pub fn new(cap: usize) -> Self {
        Self {
            buf: heapless::Vec::new(),
            cap: cap.clamp(1, N),
            state: LineState::Idle,
            truncated: false,
        }
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Feed one byte.  Returns `true` when a complete line is ready; read
    /// it with [`line`](Self::line) and release it with
    /// [`reset`](Self::reset).
    pub fn push(&mut self, byte: u8) -> bool {
        if self.state == LineState::Dispatching {
            self.reset();
        }

        if is_terminator(byte) {
            if self.state == LineState::Accumulating {
                self.state = LineState::Dispatching;
                return true;
            }
            return false;
        }

        self.state = LineState::Accumulating;
        if self.buf.len() < self.cap {
            // Cannot fail: cap <= N.
            let _ = self.buf.push(byte);
        } else {
            self.truncated = true;
        }
        false
    }

    /// End of input: dispatch a pending partial line, if any.
    pub fn finish(&mut self) -> bool {
        if self.state == LineState::Accumulating {
            self.state = LineState::Dispatching;
            return true;
        }
        false
    }

    /// Content of the dispatched line, terminator excluded.
    pub fn line(&self) -> &[u8] {
        &self.buf
    }

    /// Whether bytes were discarded from the current line.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.truncated = false;
        self.state = LineState::Idle;
    }
}
