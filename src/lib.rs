//! # seglog
//!
//! A durable key-value storage engine with:
//! - A segmented, append-only value log with bounded-size segment files
//! - An in-memory key index backed by a durable append log
//! - A two-phase durability contract (fast unconfirmed write, explicit sync)
//! - Crash recovery that replays and compacts segments on startup
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                                │
//! │        put/get (bytes)        put_number/get_number          │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │    Value Log     │               │    Key Index    │
//!   │  (segments +     │               │  (numbers.idx)  │
//!   │   rotation)      │               └─────────────────┘
//!   └────────┬────────┘
//!            │ key → virtual offset
//!            ▼
//!   ┌─────────────────┐
//!   │    Key Index    │
//!   │   (keys.idx)    │
//!   └─────────────────┘
//! ```
//!
//! Writes become visible to readers only after a durable sync confirms them;
//! a [`SyncWorker`](engine::SyncWorker) drives that confirmation on a fixed
//! interval.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod vlog;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SegLogError};
pub use config::Config;
pub use engine::{Engine, SyncWorker};
pub use index::KeyIndex;
pub use vlog::ValueLog;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of seglog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
