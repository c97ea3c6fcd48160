//! Key Index Module
//!
//! Durable key → location mapping with a two-phase durability contract:
//! writes are flushed to the OS immediately but become visible to readers
//! only after an explicit durable sync confirms them.
//!
//! ## Responsibilities
//! - Map keys to opaque 64-bit locations (callers define their meaning)
//! - Append every write to a plain text log before acknowledging it
//! - Gate visibility on durable confirmation (`sync`)
//! - Rewrite the log as a compacted snapshot on startup and shutdown
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ <key> <location> <key> <location> ...        │
//! │ (UTF-8 text, single-space separated tokens)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Keys must not contain ASCII whitespace; the format has no other record
//! delimiter. Last occurrence of a key wins on load.

mod pending;
mod table;

pub use pending::PendingWrite;
pub use table::KeyIndex;
