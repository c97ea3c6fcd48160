//! Segment addressing and the active-segment handle

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::SEGMENT_PREFIX;

/// Decoded location of a record: which segment, and where within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentAddress {
    /// Id of the segment file holding the record
    pub segment_id: u64,

    /// Byte offset of the record's first byte within that file
    pub offset: u64,
}

impl SegmentAddress {
    /// Pack into a single integer: `segment_id * max_size + offset`
    ///
    /// Exact as long as a record always *starts* below `max_size`, which
    /// rotation guarantees; the record's body may extend past it.
    pub fn to_virtual(self, max_size: u64) -> u64 {
        self.segment_id * max_size + self.offset
    }

    /// Unpack a virtual offset produced by [`Self::to_virtual`]
    pub fn from_virtual(virtual_offset: u64, max_size: u64) -> Self {
        Self {
            segment_id: virtual_offset / max_size,
            offset: virtual_offset % max_size,
        }
    }
}

/// Generate the file path for a segment with the given id
/// `segment_42` for id 42
pub(super) fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{SEGMENT_PREFIX}{id}"))
}

/// The segment currently receiving appends
///
/// Opened in append mode, so a seek for a read can never move the position
/// writes land at. The write offset is tracked here rather than queried from
/// the file, because a record's virtual offset must be known before the
/// bytes hit the file.
pub(super) struct ActiveSegment {
    /// This segment's id
    pub id: u64,

    /// Open handle, used for both appends and reads of this segment
    pub file: File,

    /// Byte offset the next record will start at
    pub offset: u64,

    /// First live segment id, carried here so rotation can persist the range
    pub first_id: u64,
}

impl ActiveSegment {
    /// Create (or truncate) the segment file for `id` and make it active
    ///
    /// Truncation covers the crash window between creating a segment file
    /// and persisting the advanced range: a leftover file of this id must
    /// not contribute stale bytes.
    pub fn create(dir: &Path, id: u64, first_id: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(segment_path(dir, id))?;
        file.set_len(0)?;

        Ok(Self {
            id,
            file,
            offset: 0,
            first_id,
        })
    }
}
