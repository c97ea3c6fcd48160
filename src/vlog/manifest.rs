//! Segment-range metadata
//!
//! A small text file recording which segment ids are currently live:
//! two whitespace-separated integers, `first_segment_id` and
//! `next_segment_id`. The current active segment is `next - 1`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Live segment id range `[first, next)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    /// Oldest segment id still on disk
    pub first: u64,

    /// Id the next rotated-in segment will be assigned
    pub next: u64,
}

impl SegmentRange {
    /// Load the range from disk
    ///
    /// Returns `Ok(None)` when the file is missing or malformed; both are
    /// treated as a cold start by the caller, not as errors.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut tokens = raw.split_whitespace();
        let first = tokens.next().and_then(|t| t.parse::<u64>().ok());
        let next = tokens.next().and_then(|t| t.parse::<u64>().ok());

        match (first, next) {
            (Some(first), Some(next)) => Ok(Some(Self { first, next })),
            _ => {
                tracing::warn!(path = %path.display(), "malformed segment range, starting cold");
                Ok(None)
            }
        }
    }

    /// Persist the range, replacing any previous contents
    pub fn store(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "{} {}", self.first, self.next)?;
        file.flush()?;
        Ok(())
    }
}
