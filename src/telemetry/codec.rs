//! Line codec for telemetry records.
//!
//! Wire format (one record per line, `;`-separated `KEY:VALUE` pairs):
//! ```text
//! ┌─────────┬──────────┬─────────┬─────────┬────────┬───────────┬───────────┬──────────┬────┐
//! │ EVT:TYPE│ CONF:0.91│ LAT:4dp │ LON:4dp │ TS:int │ [NODE:id] │ [RSSI:int │ SNR:1dp] │ \n │
//! └─────────┴──────────┴─────────┴─────────┴────────┴───────────┴───────────┴──────────┴────┘
//! ```
//!
//! Encoding is allocation-free into a fixed [`Line`] buffer.  Decoding
//! borrows the input and never panics: any byte string either yields a
//! record or a [`DecodeError`].

use core::fmt::Write;
use core::str::FromStr;

use super::{
    LinkQuality, TelemetryRecord, validate_confidence, validate_event_type, validate_latitude,
    validate_longitude, validate_node_id,
};
use crate::error::{DecodeError, EnrichError, Field};

/// Maximum wire line length in bytes (including the terminator).
pub const MAX_LINE_LEN: usize = 255;

/// Capacity of an encoded line buffer.  Field bounds keep the longest
/// possible record well below this.
pub const LINE_CAPACITY: usize = 256;

/// An encoded, newline-terminated line.
pub type Line = heapless::String<LINE_CAPACITY>;

// ───────────────────────────────────────────────────────────────
// Encode
// ───────────────────────────────────────────────────────────────

/// Encode a record into its canonical line.
///
/// Key order is fixed (`EVT, CONF, LAT, LON, TS, NODE, RSSI, SNR`), so the
/// output is deterministic for a given record.
pub fn encode(record: &TelemetryRecord) -> Line {
    let mut line = Line::new();
    let written = write_record(&mut line, record);
    debug_assert!(written.is_ok(), "encoded record exceeded LINE_CAPACITY");
    line
}

fn write_record(out: &mut impl Write, r: &TelemetryRecord) -> core::fmt::Result {
    write!(
        out,
        "EVT:{};CONF:{:.2};LAT:{:.4};LON:{:.4};TS:{}",
        r.event_type, r.confidence, r.latitude, r.longitude, r.timestamp
    )?;
    if let Some(node) = &r.node_id {
        write!(out, ";NODE:{}", node)?;
    }
    if let Some(lq) = r.link_quality {
        write!(out, ";RSSI:{};SNR:{:.1}", lq.rssi, lq.snr)?;
    }
    out.write_char('\n')
}

// ───────────────────────────────────────────────────────────────
// Decode
// ───────────────────────────────────────────────────────────────

/// Raw borrowed values, one slot per known key.
#[derive(Default)]
struct RawFields<'a> {
    event_type: Option<&'a str>,
    confidence: Option<&'a str>,
    latitude: Option<&'a str>,
    longitude: Option<&'a str>,
    timestamp: Option<&'a str>,
    node_id: Option<&'a str>,
    rssi: Option<&'a str>,
    snr: Option<&'a str>,
}

/// Decode a line using the default [`MAX_LINE_LEN`] cap.
pub fn decode(bytes: &[u8]) -> Result<TelemetryRecord, DecodeError> {
    decode_with_cap(bytes, MAX_LINE_LEN)
}

/// Decode a line that was cut at `cap` bytes.
///
/// The text after the last `;` may be the front of a longer segment.  When
/// the whole line does not decode, only the segments before that fragment
/// are decoded.
pub fn decode_truncated(bytes: &[u8], cap: usize) -> Result<TelemetryRecord, DecodeError> {
    match decode_with_cap(bytes, cap) {
        Ok(record) => Ok(record),
        Err(e) => match bytes.iter().rposition(|&b| b == b';') {
            Some(end) => decode_with_cap(&bytes[..end], cap),
            None => Err(e),
        },
    }
}

/// Decode a line, rejecting input longer than `cap` bytes.
///
/// Trailing `\r`/`\n` are ignored.  Unknown keys are skipped; `EVT` and
/// `CONF` are required; `LAT`, `LON` and `TS` default to zero.
pub fn decode_with_cap(bytes: &[u8], cap: usize) -> Result<TelemetryRecord, DecodeError> {
    if bytes.len() > cap {
        return Err(DecodeError::Oversize {
            len: bytes.len(),
            cap,
        });
    }

    let text = core::str::from_utf8(bytes).map_err(|_| DecodeError::MalformedValue(Field::Line))?;
    let text = text.trim_end_matches(['\r', '\n']);

    let mut raw = RawFields::default();
    for segment in text.split(';') {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment
            .split_once(':')
            .ok_or(DecodeError::MalformedValue(Field::Line))?;
        if key.is_empty() {
            return Err(DecodeError::MalformedValue(Field::Line));
        }

        let (slot, field) = match key {
            "EVT" => (&mut raw.event_type, Field::EventType),
            "CONF" => (&mut raw.confidence, Field::Confidence),
            "LAT" => (&mut raw.latitude, Field::Latitude),
            "LON" => (&mut raw.longitude, Field::Longitude),
            "TS" => (&mut raw.timestamp, Field::Timestamp),
            "NODE" => (&mut raw.node_id, Field::NodeId),
            "RSSI" => (&mut raw.rssi, Field::Rssi),
            "SNR" => (&mut raw.snr, Field::Snr),
            // Forward compatibility: newer producers may add keys.
            _ => continue,
        };
        if slot.is_some() {
            return Err(DecodeError::MalformedValue(field));
        }
        *slot = Some(value);
    }

    let event_type = raw
        .event_type
        .ok_or(DecodeError::MissingField(Field::EventType))?;
    let confidence = raw
        .confidence
        .ok_or(DecodeError::MissingField(Field::Confidence))?;

    let event_type = validate_event_type(event_type)?;
    let confidence = validate_confidence(parse(confidence, Field::Confidence)?)?;
    let latitude = validate_latitude(parse_or(raw.latitude, Field::Latitude, 0.0)?)?;
    let longitude = validate_longitude(parse_or(raw.longitude, Field::Longitude, 0.0)?)?;
    let timestamp = parse_or(raw.timestamp, Field::Timestamp, 0_i64)?;
    let node_id = raw.node_id.map(validate_node_id).transpose()?;

    let link_quality = match (raw.rssi, raw.snr) {
        (Some(rssi), Some(snr)) => {
            let rssi = parse::<i16>(rssi, Field::Rssi)?;
            let snr = parse::<f32>(snr, Field::Snr)?;
            if !snr.is_finite() {
                return Err(DecodeError::MalformedValue(Field::Snr));
            }
            Some(LinkQuality { rssi, snr })
        }
        (Some(_), None) => return Err(DecodeError::MissingField(Field::Snr)),
        (None, Some(_)) => return Err(DecodeError::MissingField(Field::Rssi)),
        (None, None) => None,
    };

    Ok(TelemetryRecord {
        event_type,
        confidence,
        latitude,
        longitude,
        timestamp,
        node_id,
        link_quality,
    })
}

fn parse<T: FromStr>(value: &str, field: Field) -> Result<T, DecodeError> {
    value
        .parse::<T>()
        .map_err(|_| DecodeError::MalformedValue(field))
}

fn parse_or<T: FromStr>(value: Option<&str>, field: Field, default: T) -> Result<T, DecodeError> {
    match value {
        Some(v) => parse(v, field),
        None => Ok(default),
    }
}

// ───────────────────────────────────────────────────────────────
// Enrich
// ───────────────────────────────────────────────────────────────

/// Return a copy of `record` carrying the receiver's link-quality reading.
pub fn enrich(
    record: &TelemetryRecord,
    rssi: i16,
    snr: f32,
) -> Result<TelemetryRecord, EnrichError> {
    if record.link_quality.is_some() {
        return Err(EnrichError::AlreadyEnriched);
    }
    if !snr.is_finite() {
        return Err(EnrichError::InvalidSnr);
    }
    let mut enriched = record.clone();
    enriched.link_quality = Some(LinkQuality { rssi, snr });
    Ok(enriched)
}
