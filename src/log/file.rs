//! Log File
//!
//! Append/random-read access to one on-disk log with a tracked write offset.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{CaskError, Result};

use super::entry::{Entry, EntryHeader, HEADER_SIZE};
use super::fio;
use super::scan::LogIterator;

/// One append-growable log file
///
/// `offset` is where the next entry goes. It starts at the file length, so
/// reopening an existing file continues after its last entry. Writes are
/// positional at `offset`, never OS append-mode.
#[derive(Debug)]
pub struct LogFile {
    /// Current location of the file
    path: PathBuf,
    /// Handle shared by readers (positional reads) and the writer
    file: File,
    /// End of valid data
    offset: u64,
    /// When to fsync
    sync_strategy: SyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
}

impl LogFile {
    /// Open or create a log file, keeping existing content
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        Self::from_file(path, file, sync_strategy)
    }

    /// Create an empty log file, discarding anything already at `path`
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Self::from_file(path, file, sync_strategy)
    }

    fn from_file(path: &Path, file: File, sync_strategy: SyncStrategy) -> Result<Self> {
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Read the entry starting at `offset`
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: a complete entry
    /// - `Ok(None)`: `offset` is at or past the end of data
    /// - `Err(TruncatedEntry)`: the entry runs past the end of data
    pub fn read(&self, offset: u64) -> Result<Option<Entry>> {
        if offset >= self.offset {
            return Ok(None);
        }
        if offset + HEADER_SIZE as u64 > self.offset {
            return Err(CaskError::TruncatedEntry { offset });
        }

        let mut raw = [0u8; HEADER_SIZE];
        fio::read_exact_at(&self.file, &mut raw, offset)?;
        let header = EntryHeader::decode(&raw, offset)?;

        if offset + header.encoded_size() > self.offset {
            return Err(CaskError::TruncatedEntry { offset });
        }

        // Key and value are contiguous; one read, then split
        let mut key = vec![0u8; header.payload_size() as usize];
        if !key.is_empty() {
            fio::read_exact_at(&self.file, &mut key, offset + HEADER_SIZE as u64)?;
        }
        let value = key.split_off(header.key_size as usize);

        Ok(Some(Entry {
            key,
            value,
            mark: header.mark,
        }))
    }

    /// Append an entry at the tracked offset
    ///
    /// Returns the offset the entry starts at. On any error, including a
    /// failed sync required by the strategy, the entry is cut off again and
    /// the tracked offset stays where it was.
    pub fn write(&mut self, entry: &Entry) -> Result<u64> {
        let buf = entry.encode()?;
        let at = self.offset;

        if let Err(e) = fio::write_all_at(&self.file, &buf, at) {
            self.rollback(at);
            return Err(e.into());
        }

        self.offset += buf.len() as u64;
        self.unsynced += 1;

        let synced = match self.sync_strategy {
            SyncStrategy::Never => Ok(()),
            SyncStrategy::EveryWrite => self.sync(),
            SyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync(),
            SyncStrategy::EveryNEntries { .. } => Ok(()),
        };
        if let Err(e) = synced {
            self.unsynced -= 1;
            self.rollback(at);
            return Err(e);
        }

        Ok(at)
    }

    /// Drop any bytes written past `at` so the file ends at `offset` again
    fn rollback(&mut self, at: u64) {
        if let Err(e) = self.file.set_len(at) {
            tracing::warn!(offset = at, error = %e, "Failed to cut back a failed write");
        }
        self.offset = at;
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Cut the file at `len`, discarding everything after it
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.offset = len;
        self.unsynced = 0;
        Ok(())
    }

    /// Rename the file on disk, keeping the open handle
    ///
    /// Replaces any file already at `path`.
    pub fn rename_to(&mut self, path: &Path) -> Result<()> {
        fs::rename(&self.path, path)?;
        self.path = path.to_path_buf();
        Ok(())
    }

    /// Sequential scan from offset 0
    pub fn iter(&self) -> LogIterator<'_> {
        LogIterator::new(self)
    }

    /// Where the next entry will be written (equals the file length)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_strategy(&self) -> SyncStrategy {
        self.sync_strategy
    }

    pub fn set_sync_strategy(&mut self, strategy: SyncStrategy) {
        self.sync_strategy = strategy;
    }

    /// Entries written but not yet fsynced
    pub fn unsynced_count(&self) -> usize {
        self.unsynced
    }
}
