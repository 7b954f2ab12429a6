//! Telemetry record model.
//!
//! A [`TelemetryRecord`] is the unit of transfer between the field node
//! and the hub.  Every field is range-checked on construction so that a
//! record that exists is always encodable; the wire codec lives in
//! [`codec`].
//!
//! ```text
//! EVT:<TYPE>;CONF:<0.00-1.00>;LAT:<deg>;LON:<deg>;TS:<epoch>[;NODE:<id>][;RSSI:<int>;SNR:<1dp>]
//! ```

pub mod codec;

use serde::Serialize;

use crate::error::{DecodeError, Field};

/// Maximum length of an event type (`[A-Z0-9_]+`).
pub const MAX_EVENT_TYPE_LEN: usize = 32;

/// Maximum length of a node identifier.
pub const MAX_NODE_ID_LEN: usize = 16;

/// Event type string, fixed capacity.
pub type EventType = heapless::String<MAX_EVENT_TYPE_LEN>;

/// Node identifier string, fixed capacity.
pub type NodeId = heapless::String<MAX_NODE_ID_LEN>;

/// Receiver-observed radio link quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkQuality {
    /// Received signal strength, dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio, dB.
    pub snr: f32,
}

/// One telemetry event.
///
/// Fields are private: a record can only be built through the validating
/// constructors or [`codec::decode`], and is never modified afterwards.
/// [`codec::enrich`] returns a new record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    event_type: EventType,
    confidence: f32,
    latitude: f64,
    longitude: f64,
    timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link_quality: Option<LinkQuality>,
}

impl TelemetryRecord {
    /// Build a sender-side record (no node id, no link quality).
    pub fn new(
        event_type: &str,
        confidence: f32,
        latitude: f64,
        longitude: f64,
        timestamp: i64,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            event_type: validate_event_type(event_type)?,
            confidence: validate_confidence(confidence)?,
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
            timestamp,
            node_id: None,
            link_quality: None,
        })
    }

    /// Attach the originating node identifier.
    pub fn with_node_id(mut self, node_id: &str) -> Result<Self, DecodeError> {
        self.node_id = Some(validate_node_id(node_id)?);
        Ok(self)
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn link_quality(&self) -> Option<LinkQuality> {
        self.link_quality
    }
}

// ───────────────────────────────────────────────────────────────
// Field validation (shared with the decoder)
// ───────────────────────────────────────────────────────────────

pub(crate) fn validate_event_type(s: &str) -> Result<EventType, DecodeError> {
    let ok = !s.is_empty()
        && s.len() <= MAX_EVENT_TYPE_LEN
        && s.bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
    if !ok {
        return Err(DecodeError::MalformedValue(Field::EventType));
    }
    let mut out = EventType::new();
    out.push_str(s)
        .map_err(|_| DecodeError::MalformedValue(Field::EventType))?;
    Ok(out)
}

pub(crate) fn validate_node_id(s: &str) -> Result<NodeId, DecodeError> {
    // Printable ASCII minus the separators and space.
    let ok = !s.is_empty()
        && s.len() <= MAX_NODE_ID_LEN
        && s.bytes()
            .all(|b| (0x21..=0x7E).contains(&b) && b != b';' && b != b':');
    if !ok {
        return Err(DecodeError::MalformedValue(Field::NodeId));
    }
    let mut out = NodeId::new();
    out.push_str(s)
        .map_err(|_| DecodeError::MalformedValue(Field::NodeId))?;
    Ok(out)
}

pub(crate) fn validate_confidence(v: f32) -> Result<f32, DecodeError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(DecodeError::MalformedValue(Field::Confidence))
    }
}

pub(crate) fn validate_latitude(v: f64) -> Result<f64, DecodeError> {
    if v.is_finite() && (-90.0..=90.0).contains(&v) {
        Ok(v)
    } else {
        Err(DecodeError::MalformedValue(Field::Latitude))
    }
}

pub(crate) fn validate_longitude(v: f64) -> Result<f64, DecodeError> {
    if v.is_finite() && (-180.0..=180.0).contains(&v) {
        Ok(v)
    } else {
        Err(DecodeError::MalformedValue(Field::Longitude))
    }
}
