//! Unified error types for the relay.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! binary's error handling uniform. All variants are `Copy` so they can be
//! reported through the diagnostic channel without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A telemetry line could not be decoded.
    Decode(DecodeError),
    /// A link adapter operation failed.
    Link(LinkError),
    /// Link-quality enrichment was rejected.
    Enrich(EnrichError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Enrich(e) => write!(f, "enrich: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Record fields
// ---------------------------------------------------------------------------

/// Identifies which part of a telemetry line an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    EventType,
    Confidence,
    Latitude,
    Longitude,
    Timestamp,
    NodeId,
    Rssi,
    Snr,
    /// The line structure itself (encoding, segment shape).
    Line,
}

impl Field {
    /// Wire key for this field, or `"-"` for structural errors.
    pub const fn key(self) -> &'static str {
        match self {
            Self::EventType => "EVT",
            Self::Confidence => "CONF",
            Self::Latitude => "LAT",
            Self::Longitude => "LON",
            Self::Timestamp => "TS",
            Self::NodeId => "NODE",
            Self::Rssi => "RSSI",
            Self::Snr => "SNR",
            Self::Line => "-",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => write!(f, "line"),
            other => write!(f, "{}", other.key()),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A required key (`EVT`, `CONF`, or half of an `RSSI`/`SNR` pair) is absent.
    MissingField(Field),
    /// A value failed to parse or is outside its valid range.
    MalformedValue(Field),
    /// The line is longer than the configured cap.
    Oversize { len: usize, cap: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field {field}"),
            Self::MalformedValue(field) => write!(f, "malformed value for {field}"),
            Self::Oversize { len, cap } => write!(f, "line of {len} bytes exceeds cap of {cap}"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Radio bring-up failed on every attempt; the adapter is now `Failed`.
    InitFailed,
    /// Operation requires the `Ready` state.
    NotReady,
    /// The radio rejected or failed to transmit a packet.
    TransmitFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "radio init failed"),
            Self::NotReady => write!(f, "link not ready"),
            Self::TransmitFailed => write!(f, "transmit failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Enrichment errors
// ---------------------------------------------------------------------------

/// Enrichment failures are programmer errors: the receiver must only
/// enrich freshly decoded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichError {
    /// The record already carries link-quality metadata.
    AlreadyEnriched,
    /// SNR is NaN or infinite.
    InvalidSnr,
}

impl fmt::Display for EnrichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyEnriched => write!(f, "record already carries link quality"),
            Self::InvalidSnr => write!(f, "SNR is not finite"),
        }
    }
}

impl From<EnrichError> for Error {
    fn from(e: EnrichError) -> Self {
        Self::Enrich(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
