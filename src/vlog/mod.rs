//! Value Log Module
//!
//! Segmented, append-only store of key/value records with unbounded value
//! sizes and bounded per-segment file size via rotation.
//!
//! ## Responsibilities
//! - Append framed records to the active segment, rotating at capacity
//! - Map keys to virtual offsets through an owned [`KeyIndex`](crate::index::KeyIndex)
//! - Serve reads by decoding one record at the addressed offset
//! - Replay and compact segments on startup, reclaiming superseded data
//!
//! ## Segment File Format
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Record 1                                         │
//! │ ┌────────────┬─────┬──────────────┬───────┐      │
//! │ │ KeyLen: u64│ Key │ ValueLen: u64│ Value │      │
//! │ └────────────┴─────┴──────────────┴───────┘      │
//! ├──────────────────────────────────────────────────┤
//! │ Record 2                                         │
//! │ ...                                              │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Integers are native byte order; there is no padding, no checksum, and no
//! delimiter other than the length prefixes. A virtual offset
//! `segment_id * max_size + byte_offset` addresses a record's first byte.

mod log;
mod manifest;
mod record;
mod recovery;
mod segment;

pub use log::ValueLog;
pub use manifest::SegmentRange;
pub use record::Record;
pub use recovery::RecoveryResult;
pub use segment::SegmentAddress;

// =============================================================================
// Shared Constants (used by log, recovery, segment)
// =============================================================================

/// File name of the value log's own key index
pub(crate) const INDEX_FILENAME: &str = "keys.idx";

/// File name of the segment-range metadata
pub(crate) const MANIFEST_FILENAME: &str = "segments.meta";

/// Segment files are this base name suffixed with the decimal segment id
pub(crate) const SEGMENT_PREFIX: &str = "segment_";
