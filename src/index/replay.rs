//! Log replay
//!
//! Rebuilds the KeyDir by scanning the log from offset 0.

use crate::error::{CaskError, Result};
use crate::log::{LogFile, Mark};

use super::KeyDir;

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayResult {
    /// Number of complete entries applied
    pub entries_replayed: u64,

    /// How many of those were tombstones
    pub tombstones: u64,

    /// Start of a torn final entry, if the log ends in one
    pub truncated_at: Option<u64>,
}

/// Replay a log into a fresh KeyDir
///
/// This single pass is both cold-start index construction and crash
/// recovery. A torn final entry (a write cut short by a crash) stops the
/// scan and is reported in `truncated_at`; the caller decides whether to cut
/// it off. Any other error is returned.
pub fn replay(log: &LogFile) -> Result<(KeyDir, ReplayResult)> {
    let mut keydir = KeyDir::new();
    let mut result = ReplayResult::default();

    for item in log.iter() {
        match item {
            Ok((offset, entry)) => {
                if entry.mark == Mark::Delete {
                    result.tombstones += 1;
                }
                keydir.apply(entry, offset);
                result.entries_replayed += 1;
            }
            Err(CaskError::TruncatedEntry { offset }) => {
                result.truncated_at = Some(offset);
            }
            Err(e) => return Err(e),
        }
    }

    Ok((keydir, result))
}
