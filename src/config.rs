//! Configuration for caskkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CaskError, Result};

/// Main configuration for a caskkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the log file
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── bt.kv            (active log)
    ///     └── bt.mg            (only while a merge is running)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the active log
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Request Handling
    // -------------------------------------------------------------------------
    /// Fail set/get/del on a zero-length key instead of ignoring it
    pub reject_empty_keys: bool,

    // -------------------------------------------------------------------------
    // Recovery
    // -------------------------------------------------------------------------
    /// Cut an incomplete final entry at open instead of failing
    ///
    /// Off by default: a corrupted size field looks the same as a torn
    /// write, and cutting there discards every entry after it.
    pub truncate_torn_tail: bool,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS
    Never,

    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./caskkv_data"),
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            reject_empty_keys: false,
            truncate_torn_tail: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check option combinations that cannot work
    pub fn validate(&self) -> Result<()> {
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(CaskError::Config(
                "EveryNEntries sync strategy needs a count of at least 1".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(CaskError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Turn zero-length keys into `CaskError::EmptyKey`
    pub fn reject_empty_keys(mut self, reject: bool) -> Self {
        self.config.reject_empty_keys = reject;
        self
    }

    /// Let open cut an incomplete final entry
    pub fn truncate_torn_tail(mut self, truncate: bool) -> Self {
        self.config.truncate_torn_tail = truncate;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
