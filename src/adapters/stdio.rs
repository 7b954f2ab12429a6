//! Stream transports for the bench binary.
//!
//! [`ReaderTransport`] turns a blocking reader (stdin, a serial device
//! file) into a non-blocking [`Transport`]: a background thread reads
//! chunks and hands them over a bounded channel, so the relay's poll cycle
//! never waits on the producer.  [`WriterTransport`] wraps any `io::Write`.
//!
//! The producer is never blocked either.  When the relay falls more than
//! [`QUEUE_DEPTH`] chunks behind, new input is discarded up to the next
//! newline and counted in [`ReaderTransport::overflowed_bytes`]; the line
//! it cut short is dispatched as-is and judged by the decoder.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use log::{debug, warn};

use crate::link::transport::Transport;

const CHUNK: usize = 256;

/// Chunks buffered between the reader thread and the relay.
pub const QUEUE_DEPTH: usize = 64;

/// Reader-thread side of the queue.
struct Feed {
    tx: Sender<Vec<u8>>,
    overflow: Arc<AtomicU64>,
    skipping: bool,
}

impl Feed {
    /// Queue `chunk`, or discard it if the queue is full.  Returns `false`
    /// once the reading side is gone.
    fn forward(&mut self, chunk: &[u8]) -> bool {
        let mut chunk = chunk;
        if self.skipping {
            // Resume at the newline that ends the damaged line.
            let Some(nl) = chunk.iter().position(|&b| b == b'\n') else {
                self.discard(chunk.len());
                return true;
            };
            self.discard(nl);
            chunk = &chunk[nl..];
        }

        match self.tx.try_send(chunk.to_vec()) {
            Ok(()) => {
                self.skipping = false;
                true
            }
            Err(TrySendError::Full(_)) => {
                if !self.skipping {
                    debug!("IO | relay lagging, discarding input to next newline");
                }
                self.skipping = true;
                self.discard(chunk.len());
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    fn discard(&self, n: usize) {
        self.overflow.fetch_add(n as u64, Ordering::Relaxed);
    }
}

pub struct ReaderTransport {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    overflow: Arc<AtomicU64>,
    closed: bool,
}

impl ReaderTransport {
    /// Start a reader thread over `reader`.
    pub fn spawn<R: Read + Send + 'static>(mut reader: R) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(QUEUE_DEPTH);
        let overflow = Arc::new(AtomicU64::new(0));
        let mut feed = Feed {
            tx,
            overflow: Arc::clone(&overflow),
            skipping: false,
        };
        thread::Builder::new()
            .name("transport-reader".into())
            .spawn(move || {
                let mut buf = [0u8; CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            if !feed.forward(&buf[..n]) {
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(e) => {
                            warn!("IO | reader stopped: {e}");
                            break;
                        }
                    }
                }
                debug!("IO | reader reached end of input");
            })?;
        Ok(Self {
            rx,
            pending: VecDeque::new(),
            overflow,
            closed: false,
        })
    }

    pub fn stdin() -> io::Result<Self> {
        Self::spawn(io::stdin())
    }

    /// Input bytes discarded because the relay fell behind.
    pub fn overflowed_bytes(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    fn pump(&mut self) {
        for _ in 0..QUEUE_DEPTH {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
    }

    /// Input has ended and every byte has been read.
    pub fn is_finished(&mut self) -> bool {
        self.pump();
        self.closed && self.pending.is_empty()
    }
}

impl Transport for ReaderTransport {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.len() < buf.len() {
            self.pump();
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "read-only transport"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Write-only transport over any `io::Write`.
pub struct WriterTransport<W: Write> {
    inner: W,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl WriterTransport<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    type Error = io::Error;

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write_all(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn available(&self) -> bool {
        false
    }
}
