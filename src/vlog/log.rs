//! ValueLog implementation
//!
//! Coordinates the active segment, rotation, the owned key index, and the
//! startup recovery pass.

use std::fs::{self, File};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::index::KeyIndex;
use crate::SegLogError;

use super::record::Record;
use super::recovery::{self, RecoveryResult};
use super::segment::{segment_path, ActiveSegment, SegmentAddress};
use super::{SegmentRange, INDEX_FILENAME, MANIFEST_FILENAME};

/// Segmented, append-only value store addressed by key
///
/// ## Concurrency
///
/// Only the active-segment handle is guarded (rotation replaces it while
/// durable flushes and reads of the active segment use it). Record framing
/// and the owned [`KeyIndex`]'s lock are orthogonal and never nested under
/// the segment lock: `put` releases the segment lock before touching the
/// index, so concurrent puts serialize only on the shared append point and
/// on the index's own internal locks.
pub struct ValueLog {
    /// Directory holding segments, the manifest, and the key index log
    pub(super) dir: PathBuf,

    /// Soft segment capacity; also the virtual-offset multiplier
    pub(super) max_size: u64,

    /// Key → virtual offset
    pub(super) index: KeyIndex,

    /// The segment currently receiving appends
    active: Mutex<ActiveSegment>,

    /// Stats from the recovery pass that ran at open
    recovery: RecoveryResult,
}

impl ValueLog {
    /// Open or create a value log in the given directory
    ///
    /// On startup:
    /// 1. Load the segment range; missing or malformed means cold start
    /// 2. Open a fresh active segment under the advanced `next` id
    /// 3. Replay the previously-known segments, re-appending live records
    ///    and deleting replayed files (see [`RecoveryResult`])
    /// 4. Sync, so the re-appended index entries are confirmed before the
    ///    old offsets' files are gone
    /// 5. Persist the new segment range
    pub fn open(dir: &Path, max_size: u64) -> Result<Self> {
        if max_size == 0 {
            return Err(SegLogError::Config(
                "segment_max_size must be nonzero".to_string(),
            ));
        }

        fs::create_dir_all(dir)?;
        let manifest_path = dir.join(MANIFEST_FILENAME);

        let previous = match SegmentRange::load(&manifest_path)? {
            Some(range) => range,
            None => {
                let range = SegmentRange { first: 0, next: 0 };
                range.store(&manifest_path)?;
                range
            }
        };

        let index = KeyIndex::open(&dir.join(INDEX_FILENAME))?;

        // The most recent previously-known segment is retained by recovery
        // and becomes the first live id; on a cold start nothing precedes us.
        let first_id = if previous.next > previous.first {
            previous.next - 1
        } else {
            previous.first
        };

        let active = ActiveSegment::create(dir, previous.next, first_id)?;
        SegmentRange {
            first: first_id,
            next: previous.next + 1,
        }
        .store(&manifest_path)?;

        let mut vlog = Self {
            dir: dir.to_path_buf(),
            max_size,
            index,
            active: Mutex::new(active),
            recovery: RecoveryResult::default(),
        };

        let result = recovery::recover(&vlog, previous)?;
        vlog.sync()?;

        let next = vlog.active.lock().id + 1;
        SegmentRange {
            first: first_id,
            next,
        }
        .store(&manifest_path)?;

        tracing::info!(
            dir = %dir.display(),
            segments_scanned = result.segments_scanned,
            segments_deleted = result.segments_deleted,
            records_rewritten = result.records_rewritten,
            records_skipped = result.records_skipped,
            "value log recovered"
        );

        vlog.recovery = result;
        Ok(vlog)
    }

    /// Store a value under a key
    ///
    /// Appends a framed record to the active segment (rotating first if the
    /// segment is at capacity), then records the record's virtual offset in
    /// the key index. The key stays invisible to `get` until the next sync.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let encoded = Record::encode(key, value);

        let address = {
            let mut active = self.active.lock();

            // Capacity is advisory: checked before a record begins, never
            // against the record's own size
            if active.offset >= self.max_size {
                self.rotate(&mut active)?;
            }

            let address = SegmentAddress {
                segment_id: active.id,
                offset: active.offset,
            };
            // Append-mode handle: writes land at end of file regardless of
            // read-side seeks
            active.file.write_all(&encoded)?;
            active.offset += encoded.len() as u64;
            address
        };

        self.index.put(key, address.to_virtual(self.max_size))
    }

    /// Fetch the value stored under a key
    ///
    /// Returns `None` for keys that were never confirmed durable. The read
    /// goes straight to the addressed segment: through the already-open
    /// handle when the record lives in the active segment, else by opening
    /// the segment file by id.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let virtual_offset = match self.index.find(key) {
            Some(offset) => offset,
            None => return Ok(None),
        };
        let address = SegmentAddress::from_virtual(virtual_offset, self.max_size);

        let mut active = self.active.lock();
        if address.segment_id == active.id {
            let record = read_record(&mut active.file, address.offset)?;
            return Ok(Some(record.value));
        }
        drop(active);

        let mut file = File::open(segment_path(&self.dir, address.segment_id))?;
        let record = read_record(&mut file, address.offset)?;
        Ok(Some(record.value))
    }

    /// Confirm outstanding writes durable
    ///
    /// Syncs the key index (draining its pending queue), then forces the
    /// active segment's bytes to stable storage. Failure of either flush is
    /// the non-recoverable [`SegLogError::Sync`].
    pub fn sync(&self) -> Result<()> {
        self.index.sync()?;

        let active = self.active.lock();
        active
            .file
            .sync_data()
            .map_err(|e| SegLogError::Sync(e.to_string()))?;
        Ok(())
    }

    /// Sync and compact the key index snapshot (shutdown path)
    pub fn close(&self) -> Result<()> {
        self.sync()?;
        self.index.compact()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Stats from the recovery pass that ran at open
    pub fn recovery_stats(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Id of the segment currently receiving appends
    pub fn active_segment_id(&self) -> u64 {
        self.active.lock().id
    }

    /// Number of confirmed keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no keys are confirmed
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The directory holding this log's files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Swap in a fresh segment and persist the advanced range
    fn rotate(&self, active: &mut ActiveSegment) -> Result<()> {
        let next_id = active.id + 1;
        let rotated = ActiveSegment::create(&self.dir, next_id, active.first_id)?;

        // Persisting here keeps the manifest ahead of the files: a crash
        // must never let a later recovery reuse a live segment id
        SegmentRange {
            first: active.first_id,
            next: next_id + 1,
        }
        .store(&self.dir.join(MANIFEST_FILENAME))?;

        tracing::debug!(segment = next_id, "rotated to new segment");
        *active = rotated;
        Ok(())
    }
}

/// Decode the record starting at `offset`
fn read_record(file: &mut File, offset: u64) -> Result<Record> {
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(file);
    match Record::read_from(&mut reader)? {
        Some(record) => Ok(record),
        None => Err(SegLogError::Record(format!(
            "truncated record at offset {offset}"
        ))),
    }
}
