//! Startup recovery and compaction
//!
//! Replays the previously-known segments in ascending order, re-appending
//! exactly the live (most-recently-written) record for every key into fresh
//! segments and deleting the replayed files. Superseded and orphaned records
//! are left behind; this is the steady-state reclamation path, not an
//! anomaly.

use std::fs::File;
use std::io::BufReader;

use crate::error::Result;

use super::record::Record;
use super::segment::{segment_path, SegmentAddress};
use super::{SegmentRange, ValueLog};

/// Result of a recovery pass
#[derive(Debug, Default, Clone)]
pub struct RecoveryResult {
    /// Segments decoded during the pass
    pub segments_scanned: u64,

    /// Replayed segment files removed from disk
    pub segments_deleted: u64,

    /// Live records re-appended into fresh segments
    pub records_rewritten: u64,

    /// Superseded or orphaned records left behind
    pub records_skipped: u64,
}

/// Replay and compact the previously-known segments `[first, next)`
///
/// For each decoded record, the owning index decides its fate:
/// - key absent → orphaned, skipped
/// - stored offset equals the record's own offset → live, re-appended
///   through the normal `put` path (rotating and re-indexing as usual)
/// - stored offset differs → superseded by a later write, skipped
///
/// Every replayed segment is deleted except the most recent one
/// (`next - 1`), which is retained alongside the fresh segments.
pub(super) fn recover(log: &ValueLog, previous: SegmentRange) -> Result<RecoveryResult> {
    let mut result = RecoveryResult::default();

    for id in previous.first..previous.next {
        let path = segment_path(&log.dir, id);
        let mut reader = BufReader::new(File::open(&path)?);
        let mut offset = 0u64;

        // A truncated tail ends this segment's scan without error
        while let Some(record) = Record::read_from(&mut reader)? {
            let address = SegmentAddress {
                segment_id: id,
                offset,
            };
            offset += record.encoded_size();

            match log.index.find(&record.key) {
                Some(stored) if stored == address.to_virtual(log.max_size) => {
                    log.put(&record.key, &record.value)?;
                    result.records_rewritten += 1;
                }
                _ => {
                    result.records_skipped += 1;
                }
            }
        }

        result.segments_scanned += 1;

        // Retain exactly the most recent previously-known segment
        if id != previous.next - 1 {
            std::fs::remove_file(&path)?;
            result.segments_deleted += 1;
        }
    }

    Ok(result)
}
