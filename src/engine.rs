//! Engine Module
//!
//! The storage engine facade that pairs the two index consumers.
//!
//! ## Responsibilities
//! - Route byte values through the segmented value log
//! - Route numeric locations through a standalone key index
//! - Expose the periodic sync entry point and a worker that drives it
//! - Open both components (running value-log recovery) on startup

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};

use crate::config::Config;
use crate::error::Result;
use crate::index::KeyIndex;
use crate::vlog::ValueLog;
use crate::SegLogError;

/// The main storage engine
///
/// ## Concurrency Model
///
/// Safe under true parallel access. All methods take `&self`:
/// - `put`/`get` serialize only on the value log's active-segment lock and
///   the key index's internal locks
/// - `sync` is expected from one periodic caller ([`SyncWorker`] or an
///   external scheduler), not from request handlers
///
/// There is no cross-key isolation and no cancellation: every call runs to
/// completion or fails, and a failed durable flush is terminal (see
/// [`SegLogError::is_fatal`]).
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Segmented value store (owns its own key index)
    values: ValueLog,

    /// Standalone numeric index for offset bookkeeping
    numbers: KeyIndex,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const NUMBERS_FILENAME: &'static str = "numbers.idx";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open the value log (replays and compacts segments)
    /// 3. Open the numeric index (loads and compacts its snapshot)
    pub fn open(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let values = ValueLog::open(&config.data_dir, config.segment_max_size)?;
        let numbers = KeyIndex::open(&config.data_dir.join(Self::NUMBERS_FILENAME))?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            keys = values.len(),
            numbers = numbers.len(),
            "engine opened"
        );

        Ok(Self {
            config,
            values,
            numbers,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &std::path::Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Store a value under a key
    ///
    /// The write is flushed but unconfirmed: `get` may miss it until the
    /// next successful `sync`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.values.put(key, value)
    }

    /// Fetch the value stored under a key
    ///
    /// Returns `None` for unknown keys and for keys whose write has not been
    /// confirmed durable yet.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.values.get(key)
    }

    /// Record a numeric location under a key, bypassing the value log
    pub fn put_number(&self, key: &[u8], location: u64) -> Result<()> {
        self.numbers.put(key, location)
    }

    /// Look up a confirmed numeric location
    pub fn get_number(&self, key: &[u8]) -> Option<u64> {
        self.numbers.find(key)
    }

    /// Confirm all outstanding writes durable
    ///
    /// Invoked periodically by a [`SyncWorker`] or an external scheduler,
    /// not by request handlers. A failure here is non-recoverable.
    pub fn sync(&self) -> Result<()> {
        self.values.sync()?;
        self.numbers.sync()
    }

    /// Close the engine gracefully
    ///
    /// Confirms outstanding writes and rewrites both index snapshots
    /// compacted.
    pub fn close(self) -> Result<()> {
        self.values.close()?;
        self.numbers.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &std::path::Path {
        &self.config.data_dir
    }

    /// The value log (for inspecting recovery stats)
    pub fn values(&self) -> &ValueLog {
        &self.values
    }
}

/// Background thread confirming writes durable on a fixed interval
///
/// The engine's durability gate only opens at `sync`; this worker is the
/// default scheduler for it. A failed sync is terminal: the worker logs it,
/// stops, and surfaces the error from [`SyncWorker::stop`].
pub struct SyncWorker {
    stop_tx: Sender<()>,
    handle: JoinHandle<Result<()>>,
}

impl SyncWorker {
    /// Spawn a worker syncing `engine` every `config.sync_interval_ms`
    pub fn spawn(engine: Arc<Engine>) -> Self {
        let interval = Duration::from_millis(engine.config.sync_interval_ms);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::spawn(move || -> Result<()> {
            tracing::debug!(?interval, "sync worker started");
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = engine.sync() {
                            tracing::error!(error = %e, "background sync failed, stopping");
                            return Err(e);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("sync worker stopped");
                        return Ok(());
                    }
                }
            }
        });

        Self { stop_tx, handle }
    }

    /// Stop the worker and surface any terminal sync error it hit
    pub fn stop(self) -> Result<()> {
        // Send fails only if the worker already exited; join tells us why
        let _ = self.stop_tx.send(());
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(SegLogError::Sync("sync worker panicked".to_string())),
        }
    }
}
