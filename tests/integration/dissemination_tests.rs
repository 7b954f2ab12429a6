//! Event store dissemination under concurrent ingestion and subscription.

use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use forestlink::store::EventStore;
use forestlink::store::observer::Delivery;
use forestlink::telemetry::TelemetryRecord;

fn rec(ts: i64) -> TelemetryRecord {
    TelemetryRecord::new("GUNSHOT", 0.9, 27.7126, 85.3426, ts).unwrap()
}

fn timestamps(records: &[TelemetryRecord]) -> Vec<i64> {
    records.iter().map(TelemetryRecord::timestamp).collect()
}

// ── Replay-then-live under contention ─────────────────────────

#[test]
fn late_subscribers_see_a_contiguous_suffix() {
    const N: usize = 20;
    const TOTAL: i64 = 2_000;

    let store = Arc::new(EventStore::new(N));
    let start = Arc::new(Barrier::new(5));

    let writer = {
        let store = Arc::clone(&store);
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            for ts in 0..TOTAL {
                store.append(rec(ts), 0);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                thread::sleep(Duration::from_micros(50 * i));
                let sub = store.subscribe();
                // Hold the subscription until the writer is done.
                while store.aggregates().total_count < TOTAL as u64 {
                    thread::yield_now();
                }
                sub.drain()
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        let seen = timestamps(&reader.join().unwrap());
        assert!(!seen.is_empty());
        // No gap, no duplicate: consecutive timestamps ending at the last append.
        let first = seen[0];
        let expected: Vec<i64> = (first..TOTAL).collect();
        assert_eq!(seen, expected);
    }
}

#[test]
fn replay_is_bounded_by_capacity() {
    let store = Arc::new(EventStore::new(20));
    for ts in 0..57 {
        store.append(rec(ts), 0);
    }
    let sub = store.subscribe();
    assert_eq!(timestamps(&sub.drain()), (37..57).collect::<Vec<_>>());
    store.append(rec(57), 0);
    assert_eq!(sub.try_next().map(|r| r.timestamp()), Some(57));
}

#[test]
fn slow_reader_never_blocks_ingestion() {
    let store = Arc::new(EventStore::new(4));
    let sub = store.subscribe();
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for ts in 0..10_000 {
                store.append(rec(ts), 0);
            }
        })
    };
    writer.join().unwrap();

    assert!(sub.queued() <= 4);
    assert_eq!(sub.missed() + sub.queued() as u64, 10_000);
    assert_eq!(timestamps(&sub.drain()), (9_996..10_000).collect::<Vec<_>>());
}

// ── Detach semantics ──────────────────────────────────────────

#[test]
fn detached_observer_receives_nothing_further() {
    let store = EventStore::new(8);
    let (tx, rx) = mpsc::channel();
    let handle = store.attach(move |r: &TelemetryRecord| {
        tx.send(r.timestamp()).map_or(Delivery::Closed, |()| Delivery::Delivered)
    });
    store.append(rec(1), 0);
    store.detach(handle);
    store.detach(handle);
    store.append(rec(2), 0);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn dropping_a_subscription_detaches_it() {
    let store = Arc::new(EventStore::new(8));
    let sub = store.subscribe();
    let keep = store.subscribe();
    assert_eq!(store.observer_count(), 2);
    drop(sub);
    assert_eq!(store.observer_count(), 1);
    store.append(rec(1), 0);
    assert_eq!(keep.try_next().map(|r| r.timestamp()), Some(1));
}

#[test]
fn subscription_iterator_ends_when_store_is_gone() {
    let store = Arc::new(EventStore::new(8));
    store.append(rec(1), 0);
    let sub = store.subscribe();
    store.append(rec(2), 0);
    drop(store);
    assert_eq!(timestamps(&sub.collect::<Vec<_>>()), vec![1, 2]);
}

// ── Aggregates vs window ──────────────────────────────────────

#[test]
fn aggregates_outlive_the_window() {
    let store = EventStore::new(2);
    let confs = [0.2_f32, 0.4, 0.6, 0.8];
    for (ts, conf) in confs.iter().enumerate() {
        store.append(TelemetryRecord::new("SMOKE", *conf, 0.0, 0.0, ts as i64).unwrap(), 0);
    }
    let agg = store.aggregates();
    assert_eq!(agg.total_count, 4);
    assert!((agg.average_confidence.unwrap() - 0.5).abs() < 1e-6);
    assert_eq!(store.len(), 2);
    assert_eq!(store.window_stats().window_len, 2);
}
