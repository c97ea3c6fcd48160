//! Configuration for seglog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a seglog instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── keys.idx        (value-log key index append log)
    ///     ├── numbers.idx     (standalone numeric key index append log)
    ///     ├── segments.meta   (live segment id range)
    ///     └── segment_<id>    (value-log segment files)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Value Log Configuration
    // -------------------------------------------------------------------------
    /// Soft capacity of one segment file (in bytes).
    ///
    /// Rotation is checked before a record is appended, not against the
    /// record's size, so a single record may push a file past this limit.
    pub segment_max_size: u64,

    // -------------------------------------------------------------------------
    // Sync Configuration
    // -------------------------------------------------------------------------
    /// Interval between background durability syncs (milliseconds)
    pub sync_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./seglog_data"),
            segment_max_size: 64 * 1024 * 1024, // 64 MB
            sync_interval_ms: 10,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the soft segment capacity (in bytes)
    pub fn segment_max_size(mut self, size: u64) -> Self {
        self.config.segment_max_size = size;
        self
    }

    /// Set the background sync interval (in milliseconds)
    pub fn sync_interval_ms(mut self, ms: u64) -> Self {
        self.config.sync_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
