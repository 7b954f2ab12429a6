//! Transport abstraction: The byte-oriented local link.
//!
//! Concrete implementations:
//! - UART serial between the detector host and the sender node
//! - UART / USB-CDC between the receiver node and the hub
//! - stdin/stdout on the bench binary
//!
//! The relays are generic over `Transport`, so swapping the local link
//! requires zero changes to the relay logic.

use std::collections::VecDeque;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// Write all of `data`, treating a short write as an error.
pub fn write_all<T: Transport>(transport: &mut T, data: &[u8]) -> Result<(), WriteError<T::Error>> {
    let n = transport.write(data).map_err(WriteError::Transport)?;
    if n != data.len() {
        return Err(WriteError::Short {
            written: n,
            expected: data.len(),
        });
    }
    transport.flush().map_err(WriteError::Transport)
}

/// Failure of [`write_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError<E> {
    Transport(E),
    Short { written: usize, expected: usize },
}

/// In-memory transport: bytes pushed with [`MemoryTransport::push_input`]
/// are read back by the relay, writes accumulate in an output buffer.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    input: VecDeque<u8>,
    output: Vec<u8>,
    /// When set, writes fail (simulates a disconnected cable).
    fail_writes: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the relay to read.
    pub fn push_input(&mut self, data: &[u8]) {
        self.input.extend(data);
    }

    /// Everything written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Drain the written bytes.
    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.output)
    }

    /// Written output split into lines (terminators removed).
    pub fn output_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.output)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Transport for MemoryTransport {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.input.len());
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        if self.fail_writes {
            return Err(());
        }
        self.output.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.input.is_empty()
    }
}
