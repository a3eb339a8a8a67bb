//! Store Module
//!
//! The storage engine that coordinates the index and the active log.
//!
//! ## Responsibilities
//! - Open the data directory and rebuild the index by replay
//! - Serve set/get/del against the index and log
//! - Run merges under the same lock as writes

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::index::{self, KeyDir};
use crate::log::{Entry, LogFile, Mark};
use crate::merge::{self, MergeStats};

/// Index and active log, always updated together
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) keydir: KeyDir,
    pub(crate) log: LogFile,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (set/del/merge): exclusive lock on `state`
///   - Offset capture, append and index update happen as one step
///   - Merge holds the lock from scan to swap
///
/// - **Reads** (get): shared lock on `state`
///   - Log reads are positional, so readers never share a cursor
pub struct Store {
    /// Store configuration
    config: Config,

    /// Canonical location of the active log
    log_path: PathBuf,

    /// Where merge builds the replacement log
    merge_path: PathBuf,

    /// Index + active log under one readers-writer lock
    state: RwLock<State>,
}

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    pub const LOG_FILENAME: &'static str = "bt.kv";
    pub const MERGE_FILENAME: &'static str = "bt.mg";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Remove a merge file left by an interrupted merge
    /// 3. Open the log and replay it into the index
    /// 4. Fail on an incomplete final entry, or cut it when
    ///    `truncate_torn_tail` is set
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        let merge_path = config.data_dir.join(Self::MERGE_FILENAME);

        // Step 2: A merge file only survives a crash before its rename, so the
        // canonical log is still complete
        if merge_path.exists() {
            tracing::warn!(path = %merge_path.display(), "Removing stale merge file");
            fs::remove_file(&merge_path)?;
        }

        // Step 3: Replay
        let mut log = LogFile::open(&log_path, config.sync_strategy)?;
        let (keydir, replayed) = index::replay(&log)?;

        // Step 4: Drop the partial write at the tail, only when allowed
        if let Some(at) = replayed.truncated_at {
            if !config.truncate_torn_tail {
                tracing::error!(
                    offset = at,
                    log_size = log.offset(),
                    "Log ends in an incomplete entry, refusing to open"
                );
                return Err(CaskError::TruncatedEntry { offset: at });
            }
            tracing::warn!(
                offset = at,
                discarded = log.offset() - at,
                "Log ends in a torn entry, truncating"
            );
            log.truncate(at)?;
        }

        tracing::info!(
            path = %log_path.display(),
            entries = replayed.entries_replayed,
            tombstones = replayed.tombstones,
            keys = keydir.len(),
            log_size = log.offset(),
            "Opened store"
        );

        Ok(Self {
            config,
            log_path,
            merge_path,
            state: RwLock::new(State { keydir, log }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().data_dir(path.as_ref()).build())
    }

    /// Set a key to a value
    ///
    /// A zero-length key is ignored unless `reject_empty_keys` is set.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if !self.accepts(key)? {
            return Ok(());
        }

        let entry = Entry::set(key.to_vec(), value.to_vec());

        let mut state = self.state.write();
        let offset = state.log.write(&entry)?;
        state.keydir.insert(entry.key, offset);

        Ok(())
    }

    /// Get the value of a key
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key is live
    /// - `Ok(None)`: key was never written, was deleted, or is empty
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.accepts(key)? {
            return Ok(None);
        }

        let state = self.state.read();
        let Some(offset) = state.keydir.get(key) else {
            return Ok(None);
        };

        match state.log.read(offset)? {
            Some(entry) if entry.mark == Mark::Set && entry.key == key => Ok(Some(entry.value)),
            Some(_) => Err(CaskError::Corruption {
                offset,
                reason: "index points at an entry for another key".to_string(),
            }),
            None => Err(CaskError::Corruption {
                offset,
                reason: "index points past the end of the log".to_string(),
            }),
        }
    }

    /// Delete a key
    ///
    /// Deleting an absent key succeeds without writing anything.
    pub fn del(&self, key: &[u8]) -> Result<()> {
        if !self.accepts(key)? {
            return Ok(());
        }

        let mut state = self.state.write();
        if !state.keydir.contains_key(key) {
            return Ok(());
        }

        state.log.write(&Entry::delete(key.to_vec()))?;
        state.keydir.remove(key);

        Ok(())
    }

    /// Compact the log down to its live entries
    ///
    /// Holds the exclusive lock for the whole merge.
    pub fn merge(&self) -> Result<MergeStats> {
        let mut state = self.state.write();
        merge::merge(
            &mut state,
            &self.log_path,
            &self.merge_path,
            self.config.sync_strategy,
        )
    }

    /// Force sync the active log to disk
    pub fn sync(&self) -> Result<()> {
        self.state.write().log.sync()
    }

    /// Close the store gracefully
    ///
    /// Syncs pending writes to disk
    pub fn close(self) -> Result<()> {
        let mut state = self.state.into_inner();
        state.log.sync()
    }

    /// `Ok(false)` for an empty key the config lets through as a no-op
    fn accepts(&self, key: &[u8]) -> Result<bool> {
        if !key.is_empty() {
            return Ok(true);
        }
        if self.config.reject_empty_keys {
            return Err(CaskError::EmptyKey);
        }
        tracing::debug!("Ignoring request with empty key");
        Ok(false)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.state.read().keydir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().keydir.is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.state.read().keydir.contains_key(key)
    }

    /// Snapshot of the live keys, unordered
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.state
            .read()
            .keydir
            .iter()
            .map(|(k, _)| k.to_vec())
            .collect()
    }

    /// Offset of the live entry for `key` in the active log
    pub fn offset_of(&self, key: &[u8]) -> Option<u64> {
        self.state.read().keydir.get(key)
    }

    /// Size of the active log in bytes
    pub fn log_size(&self) -> u64 {
        self.state.read().log.offset()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the active log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
