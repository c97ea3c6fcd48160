//! KeyIndex implementation
//!
//! HashMap-based key → location index backed by a plain text append log.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::SegLogError;

use super::pending::PendingQueue;
use super::PendingWrite;

/// Durable key → location index
///
/// ## Concurrency
///
/// Two guarded regions, always acquired in this order (never inverted):
/// 1. `log`: the append-log writer; serializes file appends and the durable
///    flush in `sync`
/// 2. `state`: the authoritative map plus the pending queue; `find` takes
///    only this lock
///
/// Because `put` enqueues while still holding the log lock, and `sync` holds
/// the log lock across the durable flush, every write drained by a sync had
/// its bytes flushed before that sync's flush call began.
pub struct KeyIndex {
    /// Path of the append log / snapshot file
    path: PathBuf,

    /// Append-log writer (exclusive access for appends and durable flushes)
    log: Mutex<IndexLog>,

    /// Reader-visible state: confirmed entries plus unconfirmed queue
    state: Mutex<IndexState>,
}

struct IndexState {
    /// Entries proven durable; the only state visible to `find`
    authoritative: HashMap<Vec<u8>, u64>,

    /// Entries written to the log but not yet confirmed by a sync
    pending: PendingQueue,
}

struct IndexLog {
    writer: BufWriter<File>,
}

impl IndexLog {
    fn open_append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Append one `<key> <location> ` record and flush it to the OS buffer
    ///
    /// A flush to the OS buffer is not a durability guarantee; the record is
    /// only proven durable by a later `sync`.
    fn append(&mut self, key: &[u8], location: u64) -> Result<()> {
        self.writer.write_all(key)?;
        self.writer.write_all(b" ")?;
        self.writer.write_all(location.to_string().as_bytes())?;
        self.writer.write_all(b" ")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Force every appended byte to stable storage
    fn flush_durable(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| SegLogError::Sync(e.to_string()))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|e| SegLogError::Sync(e.to_string()))?;
        Ok(())
    }

    /// Replace the log with a compacted snapshot (one entry per key)
    fn rewrite(&mut self, path: &Path, entries: &HashMap<Vec<u8>, u64>) -> Result<()> {
        let mut snapshot = BufWriter::new(File::create(path)?);
        for (key, location) in entries {
            snapshot.write_all(key)?;
            snapshot.write_all(b" ")?;
            snapshot.write_all(location.to_string().as_bytes())?;
            snapshot.write_all(b" ")?;
        }
        snapshot.flush()?;

        // Re-point the append handle at the rewritten file
        *self = Self::open_append(path)?;
        Ok(())
    }
}

impl KeyIndex {
    /// Open or create an index at the given path
    ///
    /// On startup:
    /// 1. Read the append log as whitespace-separated (key, location) pairs,
    ///    in file order, last occurrence per key winning
    /// 2. Rewrite the log as a compacted snapshot to bound its growth
    /// 3. Open the log for appending
    ///
    /// Everything loaded from disk is authoritative: the bytes survived, so
    /// they are durable by definition. A missing file is a cold start.
    pub fn open(path: &Path) -> Result<Self> {
        let authoritative = Self::load(path)?;

        tracing::debug!(
            path = %path.display(),
            entries = authoritative.len(),
            "key index loaded"
        );

        let mut log = IndexLog::open_append(path)?;
        log.rewrite(path, &authoritative)?;

        Ok(Self {
            path: path.to_path_buf(),
            log: Mutex::new(log),
            state: Mutex::new(IndexState {
                authoritative,
                pending: PendingQueue::default(),
            }),
        })
    }

    /// Record a key → location mapping
    ///
    /// The record is appended to the log and flushed to the OS buffer, then
    /// queued as pending. It stays invisible to `find` until the next
    /// successful `sync` confirms it durable. On error the log may hold a
    /// partial record, but the map and queue are left unchanged.
    pub fn put(&self, key: &[u8], location: u64) -> Result<()> {
        let mut log = self.log.lock();
        log.append(key, location)?;

        let mut state = self.state.lock();
        state.pending.push(PendingWrite {
            key: key.to_vec(),
            location,
        });
        Ok(())
    }

    /// Look up a confirmed location for a key
    ///
    /// Returns `None` if the key was never confirmed durable, even if it has
    /// a pending unconfirmed write. This staleness window is deliberate.
    pub fn find(&self, key: &[u8]) -> Option<u64> {
        self.state.lock().authoritative.get(key).copied()
    }

    /// Force all appended records to stable storage and confirm them
    ///
    /// On success, drains the pending queue in FIFO order into the
    /// authoritative map, making those keys visible to `find`. On failure
    /// nothing is drained and the returned [`SegLogError::Sync`] is
    /// non-recoverable; see [`SegLogError::is_fatal`].
    pub fn sync(&self) -> Result<()> {
        let mut log = self.log.lock();
        log.flush_durable()?;

        let mut state = self.state.lock();
        let IndexState {
            authoritative,
            pending,
        } = &mut *state;
        let confirmed = pending.drain_into(authoritative);
        if confirmed > 0 {
            tracing::trace!(confirmed, "index writes confirmed durable");
        }
        Ok(())
    }

    /// Rewrite the log as a compacted snapshot of the confirmed entries
    pub fn compact(&self) -> Result<()> {
        let mut log = self.log.lock();
        let state = self.state.lock();
        log.rewrite(&self.path, &state.authoritative)
    }

    /// Sync outstanding writes and compact the log (shutdown path)
    pub fn close(&self) -> Result<()> {
        self.sync()?;
        self.compact()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of confirmed entries
    pub fn len(&self) -> usize {
        self.state.lock().authoritative.len()
    }

    /// Whether the index holds no confirmed entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of written-but-unconfirmed entries
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Path of the backing log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Parse the append log into a map, last occurrence per key winning
    ///
    /// Parsing stops at the first pair whose location is not a decimal
    /// integer, mirroring stream-extraction semantics: everything before the
    /// malformed pair is kept, everything after it is ignored.
    fn load(path: &Path) -> Result<HashMap<Vec<u8>, u64>> {
        let mut authoritative = HashMap::new();

        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(authoritative),
            Err(e) => return Err(e.into()),
        };

        let mut tokens = raw
            .split(|b| b.is_ascii_whitespace())
            .filter(|t| !t.is_empty());

        while let Some(key) = tokens.next() {
            let location = tokens
                .next()
                .and_then(|t| std::str::from_utf8(t).ok())
                .and_then(|t| t.parse::<u64>().ok());

            match location {
                Some(location) => {
                    authoritative.insert(key.to_vec(), location);
                }
                None => {
                    tracing::warn!(
                        path = %path.display(),
                        "malformed index log entry, ignoring remainder"
                    );
                    break;
                }
            }
        }

        Ok(authoritative)
    }
}
