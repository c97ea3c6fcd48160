//! Error types for seglog
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SegLogError
pub type Result<T> = std::result::Result<T, SegLogError>;

/// Unified error type for seglog operations
#[derive(Debug, Error)]
pub enum SegLogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Durability Errors
    // -------------------------------------------------------------------------
    /// A durable flush could not be completed.
    ///
    /// Non-recoverable: once a sync has been requested, callers assume earlier
    /// writes are safe, and the engine cannot tell which of its confirmed
    /// state survived. Supervisory layers must treat this as fatal and must
    /// not retry past it.
    #[error("durable flush failed: {0}")]
    Sync(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Segment error: {0}")]
    Segment(String),

    #[error("Record error: {0}")]
    Record(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SegLogError {
    /// Whether this error invalidates the durability contract.
    ///
    /// Fatal errors must terminate the engine; everything else is reported
    /// once at the point of occurrence and left to caller policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SegLogError::Sync(_))
    }
}
