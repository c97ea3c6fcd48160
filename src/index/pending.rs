//! Pending write queue
//!
//! Tracks writes that have been flushed to the append log but not yet proven
//! durable. Each write moves through two states:
//!
//! ```text
//! Written ──(durable flush succeeds)──▶ Confirmed
//! ```
//!
//! `Written` writes live here, in FIFO order. `Confirmed` writes live in the
//! authoritative map and are visible to readers.

use std::collections::{HashMap, VecDeque};

/// A key/location update flushed to the append log but not yet durable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    /// The key that was written
    pub key: Vec<u8>,

    /// The location value that was written
    pub location: u64,
}

/// Strictly ordered FIFO queue of pending writes
///
/// Ordering matters: a sync drains exactly the writes that preceded it, and
/// when the same key is written twice before a sync, the later write must be
/// drained later so that it wins in the authoritative map.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    writes: VecDeque<PendingWrite>,
}

impl PendingQueue {
    /// Enqueue a write that has been flushed but not confirmed
    pub fn push(&mut self, write: PendingWrite) {
        self.writes.push_back(write);
    }

    /// Drain every pending write into the authoritative map, oldest first
    ///
    /// Returns the number of writes confirmed.
    pub fn drain_into(&mut self, authoritative: &mut HashMap<Vec<u8>, u64>) -> usize {
        let confirmed = self.writes.len();
        for write in self.writes.drain(..) {
            authoritative.insert(write.key, write.location);
        }
        confirmed
    }

    /// Number of unconfirmed writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }
}
