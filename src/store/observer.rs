//! Observers of the event store.
//!
//! An observer is called with the store lock held, so it must not call
//! back into the store and should return quickly.  Returning
//! [`Delivery::Closed`] unregisters it.
//!
//! A [`Subscription`] queue holds at most as many records as the store
//! retains.  When a slow reader lets it fill up, the oldest queued record
//! is discarded and counted in [`Subscription::missed`]; the store is
//! never blocked.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::debug;

use crate::telemetry::TelemetryRecord;

use super::EventStore;

/// Outcome of handing one record to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The observer is gone; the store drops its registration.
    Closed,
}

pub trait Observer: Send {
    fn on_record(&mut self, record: &TelemetryRecord) -> Delivery;
}

impl<F> Observer for F
where
    F: FnMut(&TelemetryRecord) -> Delivery + Send,
{
    fn on_record(&mut self, record: &TelemetryRecord) -> Delivery {
        self(record)
    }
}

/// Identifies one attached observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverHandle(pub(crate) u64);

/// Forwards records into a bounded channel, evicting the oldest queued
/// record when it is full.  Never blocks the store.
pub struct ChannelObserver {
    tx: Sender<TelemetryRecord>,
    // Second handle on the queue, used only to evict.
    evict: Receiver<TelemetryRecord>,
    missed: Arc<AtomicU64>,
}

impl Observer for ChannelObserver {
    fn on_record(&mut self, record: &TelemetryRecord) -> Delivery {
        match self.tx.try_send(record.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(record)) => {
                if self.evict.try_recv().is_ok() {
                    self.missed.fetch_add(1, Ordering::Relaxed);
                    debug!("STORE | subscriber lagging, oldest queued record discarded");
                }
                // The store lock makes this the only sender, so a slot is free now.
                let _ = self.tx.try_send(record);
                Delivery::Delivered
            }
            Err(TrySendError::Disconnected(_)) => Delivery::Closed,
        }
    }
}

/// Replay-then-live stream of records from an [`EventStore`].
///
/// Holds only a weak reference to the store; dropping the subscription
/// detaches it.  Iteration blocks until the next record and ends once the
/// store itself is gone.
pub struct Subscription {
    store: Weak<EventStore>,
    handle: ObserverHandle,
    rx: Receiver<TelemetryRecord>,
    missed: Arc<AtomicU64>,
}

impl Subscription {
    pub(crate) fn new(store: Weak<EventStore>, handle: ObserverHandle, queue: Queue) -> Self {
        Self {
            store,
            handle,
            rx: queue.rx,
            missed: queue.missed,
        }
    }

    pub fn handle(&self) -> ObserverHandle {
        self.handle
    }

    /// Records discarded because this subscription fell behind.
    pub fn missed(&self) -> u64 {
        self.missed.load(Ordering::Relaxed)
    }

    /// Records currently waiting to be read.
    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    /// Next record if one is already queued.
    pub fn try_next(&self) -> Option<TelemetryRecord> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next record.
    pub fn next_timeout(&self, timeout: Duration) -> Option<TelemetryRecord> {
        match self.rx.recv_timeout(timeout) {
            Ok(record) => Some(record),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<TelemetryRecord> {
        self.rx.try_iter().collect()
    }
}

impl Iterator for Subscription {
    type Item = TelemetryRecord;

    fn next(&mut self) -> Option<TelemetryRecord> {
        self.rx.recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.detach(self.handle);
        }
    }
}

/// Reader half of a subscription queue.
pub(crate) struct Queue {
    rx: Receiver<TelemetryRecord>,
    missed: Arc<AtomicU64>,
}

/// Bounded queue of `depth` records (at least one).
pub(crate) fn channel(depth: usize) -> (ChannelObserver, Queue) {
    let (tx, rx) = crossbeam_channel::bounded(depth.max(1));
    let missed = Arc::new(AtomicU64::new(0));
    let observer = ChannelObserver {
        tx,
        evict: rx.clone(),
        missed: Arc::clone(&missed),
    };
    (observer, Queue { rx, missed })
}
