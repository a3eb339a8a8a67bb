//! Merge / Compaction
//!
//! Rewrites the live entries of the active log into a fresh file and swaps
//! it in, dropping superseded writes and tombstones.
//!
//! ## Steps
//! 1. Empty log: nothing to do
//! 2. Scan the log; an entry is live iff the index still points at it
//! 3. Write live entries, in log order, to the merge file
//! 4. Rename the merge file over the canonical log and repoint the index
//!
//! Nothing in the store changes until the rename succeeds. A failure before
//! that removes the merge file and leaves log and index as they were.

use std::fs;
use std::path::Path;

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::log::{Entry, LogFile, Mark};
use crate::store::State;

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Entries read from the old log
    pub entries_scanned: u64,

    /// Entries carried into the new log
    pub entries_kept: u64,

    /// Log size before the merge
    pub bytes_before: u64,

    /// Log size after the merge
    pub bytes_after: u64,

    /// Whether a new log replaced the old one
    pub swapped: bool,
}

impl MergeStats {
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Run a merge; the caller holds the store's exclusive lock
pub(crate) fn merge(
    state: &mut State,
    log_path: &Path,
    merge_path: &Path,
    sync_strategy: SyncStrategy,
) -> Result<MergeStats> {
    let bytes_before = state.log.offset();
    let mut stats = MergeStats {
        bytes_before,
        bytes_after: bytes_before,
        ..MergeStats::default()
    };

    if bytes_before == 0 {
        return Ok(stats);
    }

    // Collect live entries in scan order
    let mut live = Vec::new();
    for item in state.log.iter() {
        let (offset, entry) = item?;
        stats.entries_scanned += 1;
        if entry.mark == Mark::Set && state.keydir.is_live(&entry.key, offset) {
            live.push(entry);
        }
    }

    if live.is_empty() {
        // Old file stays as it is
        tracing::debug!(
            scanned = stats.entries_scanned,
            "Merge found no live entries, keeping log"
        );
        return Ok(stats);
    }

    let (mut merged, offsets) = match rewrite(merge_path, &live) {
        Ok(rewritten) => rewritten,
        Err(e) => {
            let _ = fs::remove_file(merge_path);
            return Err(e);
        }
    };

    // Single atomic replace of the canonical log
    if let Err(e) = merged.rename_to(log_path) {
        drop(merged);
        let _ = fs::remove_file(merge_path);
        return Err(e);
    }
    sync_dir(log_path);

    merged.set_sync_strategy(sync_strategy);
    stats.entries_kept = live.len() as u64;
    stats.bytes_after = merged.offset();
    stats.swapped = true;

    for (entry, offset) in live.into_iter().zip(offsets) {
        state.keydir.insert(entry.key, offset);
    }
    // The old handle is closed here
    state.log = merged;

    tracing::info!(
        scanned = stats.entries_scanned,
        kept = stats.entries_kept,
        bytes_before = stats.bytes_before,
        bytes_after = stats.bytes_after,
        "Merged log"
    );

    Ok(stats)
}

/// Write `live` to a new log at `path`, returning it with each entry's offset
fn rewrite(path: &Path, live: &[Entry]) -> Result<(LogFile, Vec<u64>)> {
    let mut merged = LogFile::create(path, SyncStrategy::Never)?;

    let mut offsets = Vec::with_capacity(live.len());
    for entry in live {
        offsets.push(merged.write(entry)?);
    }
    merged.sync()?;

    Ok((merged, offsets))
}

/// Persist the rename; failure only costs durability of the swap
fn sync_dir(log_path: &Path) {
    let Some(dir) = log_path.parent() else {
        return;
    };
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::warn!(error = %e, "Failed to sync data directory after merge");
    }
}
