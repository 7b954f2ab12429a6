//! Fuzz target: `SenderRelay::poll`
//!
//! Feeds an arbitrary producer byte stream through the sender relay and
//! a simulated radio.  Every packet on the air must fit the cap and
//! decode, and the relay must account for every non-empty line.
//!
//! cargo fuzz run fuzz_sender_relay

#![no_main]

use forestlink::link::radio::Radio;
use forestlink::link::sim::SimRadio;
use forestlink::link::transport::{MemoryTransport, Transport};
use forestlink::link::{LinkAdapter, LinkConfig, LinkRole};
use forestlink::relay::SenderRelay;
use forestlink::telemetry::codec::{self, MAX_LINE_LEN};
use libfuzzer_sys::fuzz_target;

struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fuzz_target!(|data: &[u8]| {
    let (tx, mut rx) = SimRadio::pair(-45, 8.5);
    let mut link = LinkAdapter::new(tx, LinkRole::Sender);
    let mut events = Vec::new();
    if link
        .initialize(&LinkConfig::default(), &mut NoDelay, &mut events)
        .is_err()
    {
        return;
    }

    let mut producer = MemoryTransport::new();
    producer.push_input(data);
    let mut sender = SenderRelay::new(MAX_LINE_LEN);

    while producer.available() {
        let _ = sender.poll(&mut producer, &mut link, &mut events);
        if let Some(packet) = rx.receive() {
            assert!(packet.payload.len() <= MAX_LINE_LEN);
            assert!(codec::decode(&packet.payload).is_ok(), "sender put an invalid record on air");
        }
    }
    sender.finish(&mut link, &mut events);
    if let Some(packet) = rx.receive() {
        assert!(codec::decode(&packet.payload).is_ok());
    }

    let stats = sender.stats();
    assert_eq!(stats.lines, stats.sent + stats.dropped + stats.transmit_failures);
});
