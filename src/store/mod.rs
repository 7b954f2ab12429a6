//! Event store: Bounded history, running aggregates and dissemination.
//!
//! The store is the one piece of state shared between contexts: the
//! receiver relay appends, any number of observers attach, detach and
//! query.  Every operation takes the same mutex, so an observer can never
//! see a half-applied append (partial eviction or aggregate update).
//!
//! ## Replay-then-live
//!
//! [`EventStore::attach`] replays the current history to the new observer
//! and registers it under one lock acquisition.  Appends are serialised
//! against it, so the observer receives every record exactly once: first
//! the replay (oldest → newest), then each live append.
//!
//! Each retained record carries the time the ingestion path received it,
//! read from its [`Clock`](crate::app::ports::Clock).  The producer's own
//! `timestamp` is left untouched.

pub mod observer;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::Serialize;

use crate::telemetry::TelemetryRecord;
use observer::{Delivery, Observer, ObserverHandle, Subscription};

/// Default bounded history length.
pub const DEFAULT_CAPACITY: usize = 20;

/// Summary over every record ever appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub total_count: u64,
    pub latest_record: Option<TelemetryRecord>,
    /// Mean confidence over all appends, not only the retained window.
    pub average_confidence: Option<f64>,
}

/// Per-type breakdown of the retained window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowStats {
    pub window_len: usize,
    pub by_type: BTreeMap<String, usize>,
    /// Producer clock of the newest record.
    pub latest_timestamp: Option<i64>,
    /// Arrival time of the newest record.
    pub latest_received_at_ms: Option<u64>,
}

/// A retained record with its arrival time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEvent {
    #[serde(flatten)]
    pub record: TelemetryRecord,
    pub received_at_ms: u64,
}

struct Inner {
    history: VecDeque<StoredEvent>,
    capacity: usize,
    total_count: u64,
    confidence_sum: f64,
    observers: Vec<(ObserverHandle, Box<dyn Observer>)>,
    next_handle: u64,
}

pub struct EventStore {
    inner: Mutex<Inner>,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventStore {
    /// `capacity` below 1 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                history: VecDeque::with_capacity(capacity),
                capacity,
                total_count: 0,
                confidence_sum: 0.0,
                observers: Vec::new(),
                next_handle: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking observer must not wedge ingestion.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Ingestion ─────────────────────────────────────────────

    /// Store a delivered record, received at `received_at_ms`, and notify
    /// every attached observer.
    pub fn append(&self, record: TelemetryRecord, received_at_ms: u64) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        inner.total_count += 1;
        inner.confidence_sum += f64::from(record.confidence());
        if inner.history.len() == inner.capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(StoredEvent {
            record,
            received_at_ms,
        });

        let Inner {
            history, observers, ..
        } = inner;
        if let Some(latest) = history.back() {
            let before = observers.len();
            observers.retain_mut(|(_, obs)| obs.on_record(&latest.record) == Delivery::Delivered);
            if observers.len() != before {
                debug!("STORE | pruned {} closed observer(s)", before - observers.len());
            }
        }
    }

    // ── Dissemination ─────────────────────────────────────────

    /// Replay the history to `observer`, then register it for live appends.
    pub fn attach(&self, mut observer: impl Observer + 'static) -> ObserverHandle {
        let mut inner = self.lock();
        let handle = ObserverHandle(inner.next_handle);
        inner.next_handle += 1;

        let open = inner
            .history
            .iter()
            .all(|event| observer.on_record(&event.record) == Delivery::Delivered);
        if open {
            inner.observers.push((handle, Box::new(observer)));
        }
        handle
    }

    /// Unregister an observer.  Unknown or already-detached handles are ignored.
    pub fn detach(&self, handle: ObserverHandle) {
        self.lock().observers.retain(|(h, _)| *h != handle);
    }

    /// Channel-backed replay-then-live stream.  The queue holds up to
    /// `capacity` records; a reader that falls further behind loses the
    /// oldest ones.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (observer, queue) = observer::channel(self.capacity());
        let handle = self.attach(observer);
        Subscription::new(Arc::downgrade(self), handle, queue)
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn aggregates(&self) -> Aggregates {
        let inner = self.lock();
        #[allow(clippy::cast_precision_loss)]
        let average_confidence =
            (inner.total_count > 0).then(|| inner.confidence_sum / inner.total_count as f64);
        Aggregates {
            total_count: inner.total_count,
            latest_record: inner.history.back().map(|e| e.record.clone()),
            average_confidence,
        }
    }

    /// The most recent `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<TelemetryRecord> {
        let inner = self.lock();
        let skip = inner.history.len().saturating_sub(limit);
        inner.history.iter().skip(skip).map(|e| e.record.clone()).collect()
    }

    /// Like [`recent`](Self::recent), with arrival times.
    pub fn recent_events(&self, limit: usize) -> Vec<StoredEvent> {
        let inner = self.lock();
        let skip = inner.history.len().saturating_sub(limit);
        inner.history.iter().skip(skip).cloned().collect()
    }

    pub fn latest(&self) -> Option<TelemetryRecord> {
        self.lock().history.back().map(|e| e.record.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn window_stats(&self) -> WindowStats {
        let inner = self.lock();
        let mut by_type = BTreeMap::new();
        for event in &inner.history {
            *by_type.entry(event.record.event_type().to_owned()).or_insert(0) += 1;
        }
        let latest = inner.history.back();
        WindowStats {
            window_len: inner.history.len(),
            by_type,
            latest_timestamp: latest.map(|e| e.record.timestamp()),
            latest_received_at_ms: latest.map(|e| e.received_at_ms),
        }
    }
}
