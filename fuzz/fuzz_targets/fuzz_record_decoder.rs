//! Fuzz target: `codec::decode`
//!
//! Drives arbitrary byte sequences into the record decoder and asserts
//! that it never panics, and that anything it accepts re-encodes to a
//! line that decodes to the same record.
//!
//! cargo fuzz run fuzz_record_decoder

#![no_main]

use forestlink::telemetry::codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(record) = codec::decode(data) else {
        return;
    };

    let line = codec::encode(&record);
    assert!(line.ends_with('\n'), "canonical line must be newline-terminated");

    // Canonical encoding is a fixed point: decode(encode(r)) re-encodes identically.
    let again = codec::decode(line.as_bytes()).expect("canonical line must decode");
    assert_eq!(codec::encode(&again), line);

    // Enrichment only succeeds on records without link quality.
    assert_eq!(
        codec::enrich(&record, -45, 8.5).is_ok(),
        record.link_quality().is_none()
    );
});
