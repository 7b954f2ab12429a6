//! End-to-end: producer bytes → sender relay → simulated radio →
//! receiver relay → consumer stream + event store → hub.

use std::sync::Arc;

use crate::mock_radio::{ManualClock, RecordingDelay, RecordingSink};

use forestlink::app::events::{DiagnosticEvent, Stage};
use forestlink::error::{DecodeError, Field, LinkError};
use forestlink::hub::HubIngest;
use forestlink::indicator::{Pattern, StatusIndicator};
use forestlink::link::sim::SimRadio;
use forestlink::link::transport::{MemoryTransport, Transport};
use forestlink::link::{LinkAdapter, LinkConfig, LinkRole, LinkState};
use forestlink::relay::{ReceiverRelay, SenderRelay};
use forestlink::store::EventStore;
use forestlink::telemetry::codec::MAX_LINE_LEN;

const GUNSHOT: &[u8] = b"EVT:GUNSHOT;CONF:0.91;LAT:27.7126;LON:85.3426;TS:1735119862;NODE:NODE1\n";

struct Bench {
    producer: MemoryTransport,
    consumer: MemoryTransport,
    sender: SenderRelay,
    receiver: ReceiverRelay,
    sender_link: LinkAdapter<SimRadio>,
    receiver_link: LinkAdapter<SimRadio>,
    store: Arc<EventStore>,
    clock: ManualClock,
    sink: RecordingSink,
}

impl Bench {
    fn new(rssi: i16, snr: f32, max_line_len: usize) -> Self {
        let (tx, rx) = SimRadio::pair(rssi, snr);
        let mut sink = RecordingSink::new();
        let mut sender_link = LinkAdapter::new(tx, LinkRole::Sender);
        let mut receiver_link = LinkAdapter::new(rx, LinkRole::Receiver);
        let config = LinkConfig::default();
        sender_link
            .initialize(&config, &mut RecordingDelay::default(), &mut sink)
            .unwrap();
        receiver_link
            .initialize(&config, &mut RecordingDelay::default(), &mut sink)
            .unwrap();
        sink.events.clear();

        let clock = ManualClock::default();
        Self {
            producer: MemoryTransport::new(),
            consumer: MemoryTransport::new(),
            sender: SenderRelay::new(max_line_len),
            receiver: ReceiverRelay::new(30, 0),
            sender_link,
            receiver_link,
            store: Arc::new(EventStore::new(20)),
            clock,
            sink,
        }
    }

    /// Run poll cycles until the producer is drained and the air is quiet.
    fn run(&mut self) {
        loop {
            let consumed = self
                .sender
                .poll(&mut self.producer, &mut self.sender_link, &mut self.sink)
                .unwrap();
            let handled = self.receiver.poll(
                &mut self.receiver_link,
                &mut self.consumer,
                &self.store,
                &self.clock,
                &mut self.sink,
            );
            if consumed == 0 && !handled {
                break;
            }
        }
        self.sender.finish(&mut self.sender_link, &mut self.sink);
        self.receiver.poll(
            &mut self.receiver_link,
            &mut self.consumer,
            &self.store,
            &self.clock,
            &mut self.sink,
        );
    }
}

// ── Scenario: single detection ────────────────────────────────

#[test]
fn gunshot_reaches_consumer_enriched() {
    let mut bench = Bench::new(-45, 8.5, MAX_LINE_LEN);
    bench.producer.push_input(GUNSHOT);
    bench.run();

    assert_eq!(
        bench.consumer.output_lines(),
        vec![
            "DATA:EVT:GUNSHOT;CONF:0.91;LAT:27.7126;LON:85.3426;TS:1735119862;NODE:NODE1;RSSI:-45;SNR:8.5"
        ]
    );
    let agg = bench.store.aggregates();
    assert_eq!(agg.total_count, 1);
    let latest = agg.latest_record.unwrap();
    assert_eq!(latest.node_id(), Some("NODE1"));
    assert!(bench.sink.events.is_empty());
}

// ── Scenario: mixed stream ────────────────────────────────────

#[test]
fn malformed_lines_are_dropped_and_counted_while_good_ones_flow() {
    let mut bench = Bench::new(-60, 4.0, MAX_LINE_LEN);
    bench.producer.push_input(b"EVT:CHAINSAW;CONF:0.80;LAT:27.7;LON:85.3;TS:1\r\n");
    bench.producer.push_input(b"garbage without separators\n");
    bench.producer.push_input(b"\n");
    bench.producer.push_input(b"EVT:VEHICLE;CONF:1.50\n");
    bench.producer.push_input(b"EVT:GUNSHOT;CONF:0.95;TS:2");
    bench.run();

    let lines = bench.consumer.output_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("DATA:EVT:CHAINSAW;CONF:0.80;"));
    assert!(lines[1].starts_with("DATA:EVT:GUNSHOT;CONF:0.95;"));

    assert_eq!(
        bench.sink.events,
        vec![
            DiagnosticEvent::RecordDropped {
                stage: Stage::Sender,
                error: DecodeError::MalformedValue(Field::Line),
            },
            DiagnosticEvent::RecordDropped {
                stage: Stage::Sender,
                error: DecodeError::MalformedValue(Field::Confidence),
            },
        ]
    );
    assert_eq!(bench.sender.stats().dropped, 2);
    assert_eq!(bench.sender.stats().sent, 2);
    assert_eq!(bench.receiver.stats().forwarded, 2);
}

// ── Scenario: overlong producer line ──────────────────────────

#[test]
fn overlong_line_is_transmitted_as_its_first_cap_bytes() {
    let mut bench = Bench::new(-70, 1.0, MAX_LINE_LEN);
    let mut line = b"EVT:GUNSHOT;CONF:0.91;NOTE:".to_vec();
    line.extend(std::iter::repeat_n(b'z', 400));
    line.push(b'\n');
    bench.producer.push_input(&line);
    bench.producer.push_input(GUNSHOT);
    bench.run();

    assert_eq!(bench.sender.stats().truncated, 1);
    assert_eq!(bench.receiver.stats().received, 2);
    assert_eq!(bench.store.len(), 2);
    assert!(bench.sink.events.contains(&DiagnosticEvent::LineTruncated {
        stage: Stage::Sender,
        cap: MAX_LINE_LEN,
    }));
}

// ── Scenario: dead sender radio ───────────────────────────────

#[test]
fn dead_sender_radio_reports_every_record_and_signals_fault() {
    let (tx, rx) = SimRadio::pair(-45, 8.5);
    let tx = tx.dead();
    let mut sink = RecordingSink::new();
    let mut sender_link = LinkAdapter::new(tx, LinkRole::Sender);
    let mut receiver_link = LinkAdapter::new(rx, LinkRole::Receiver);
    let mut delay = RecordingDelay::default();
    assert!(sender_link.initialize(&LinkConfig::default(), &mut delay, &mut sink).is_err());
    receiver_link
        .initialize(&LinkConfig::default(), &mut delay, &mut sink)
        .unwrap();

    let mut indicator = StatusIndicator::new();
    indicator.set_link_state(sender_link.state());
    indicator.tick(0);
    assert_eq!(indicator.pattern(), Pattern::RapidFlash);
    assert_eq!(sender_link.state(), LinkState::Failed);

    sink.events.clear();
    let mut producer = MemoryTransport::new();
    producer.push_input(GUNSHOT);
    producer.push_input(GUNSHOT);
    let mut sender = SenderRelay::new(MAX_LINE_LEN);
    while producer.available() {
        sender.poll(&mut producer, &mut sender_link, &mut sink).unwrap();
    }
    assert_eq!(
        sink.events,
        vec![DiagnosticEvent::TransmitFailed(LinkError::NotReady); 2]
    );
    assert_eq!(receiver_link.poll_receive(), Ok(None));
}

// ── Scenario: receiver → hub ──────────────────────────────────

#[test]
fn hub_ingests_receiver_output_including_status_lines() {
    let mut bench = Bench::new(-45, 8.5, MAX_LINE_LEN);
    bench.producer.push_input(GUNSHOT);
    bench.run();
    bench.clock.advance_secs(30);
    bench.run();
    bench
        .producer
        .push_input(b"EVT:CHAINSAW;CONF:0.70;LAT:27.8;LON:85.4;TS:1735119900;NODE:NODE2\n");
    bench.run();

    let mut stream = MemoryTransport::new();
    stream.push_input(&bench.consumer.take_output());
    let hub_store = EventStore::new(20);
    let mut hub = HubIngest::new();
    let mut hub_sink = RecordingSink::new();
    let hub_clock = ManualClock::default();
    hub_clock.advance_secs(90);
    while stream.available() {
        hub.poll(&mut stream, &hub_store, &hub_clock, &mut hub_sink).unwrap();
    }
    hub.finish(&hub_store, &hub_clock, &mut hub_sink);

    assert_eq!(hub.stats().ingested, 2);
    assert_eq!(hub.stats().ignored, 1);
    assert_eq!(hub_store.recent(20), bench.store.recent(20));
    let window = hub_store.window_stats();
    assert_eq!(window.by_type.get("GUNSHOT"), Some(&1));
    assert_eq!(window.latest_timestamp, Some(1_735_119_900));
    // The receiver stamped its arrival; the hub stamps its own.
    assert_eq!(bench.store.window_stats().latest_received_at_ms, Some(30_000));
    assert_eq!(window.latest_received_at_ms, Some(90_000));
}

// ── Scenario: live subscriber ─────────────────────────────────

#[test]
fn subscriber_sees_replay_then_live_across_the_pipeline() {
    let mut bench = Bench::new(-45, 8.5, MAX_LINE_LEN);
    bench.producer.push_input(GUNSHOT);
    bench.run();

    let sub = bench.store.subscribe();
    bench.producer.push_input(b"EVT:CHAINSAW;CONF:0.70\n");
    bench.run();

    let seen: Vec<String> = sub.drain().iter().map(|r| r.event_type().to_owned()).collect();
    assert_eq!(seen, vec!["GUNSHOT", "CHAINSAW"]);
}
