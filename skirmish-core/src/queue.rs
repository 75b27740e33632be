//! Bounded outbound snapshot queue with drop-oldest overflow.
//!
//! The game tick pushes, the writer task pops. A push never blocks: when
//! the queue is full the oldest not-yet-transmitted snapshot is evicted
//! so the freshest state always makes it onto the wire.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::snapshot::Snapshot;

/// Default number of snapshots waiting for the writer.
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 8;

pub struct SendQueue {
    items: Mutex<VecDeque<Snapshot>>,
    capacity: usize,
    ready: Notify,
}

impl SendQueue {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ready: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Enqueue `snapshot`, returning the evicted entry if the queue was full.
    ///
    /// Eviction and insertion happen under one lock, so at most one entry
    /// is dropped per push.
    pub fn push(&self, snapshot: Snapshot) -> Option<Snapshot> {
        let evicted = {
            let mut items = self.lock();
            let evicted = if items.len() >= self.capacity {
                items.pop_front()
            } else {
                None
            };
            items.push_back(snapshot);
            evicted
        };
        self.ready.notify_one();
        evicted
    }

    /// Dequeue the oldest pending snapshot.
    pub fn pop(&self) -> Option<Snapshot> {
        self.lock().pop_front()
    }

    /// Resolves once a push has happened since the last wake-up.
    ///
    /// A push with no waiter stores a permit, so checking [`pop`](Self::pop)
    /// and then awaiting this never misses a snapshot.
    pub async fn ready(&self) {
        self.ready.notified().await
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Snapshot>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
