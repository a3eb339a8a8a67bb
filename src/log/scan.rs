//! Log Scanner
//!
//! Sequential iteration over every entry of a log file.

use crate::error::Result;

use super::entry::Entry;
use super::file::LogFile;

/// Iterator over `(offset, entry)` pairs in file order
///
/// Ends cleanly at end-of-data. The first error is yielded once and ends
/// the iteration.
pub struct LogIterator<'a> {
    log: &'a LogFile,
    /// Start of the next entry
    offset: u64,
    done: bool,
}

impl<'a> LogIterator<'a> {
    pub(super) fn new(log: &'a LogFile) -> Self {
        Self {
            log,
            offset: 0,
            done: false,
        }
    }

    /// Offset the next call to `next` reads from
    pub fn position(&self) -> u64 {
        self.offset
    }
}

impl<'a> Iterator for LogIterator<'a> {
    type Item = Result<(u64, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.log.read(self.offset) {
            Ok(Some(entry)) => {
                let at = self.offset;
                self.offset += entry.encoded_size();
                Some(Ok((at, entry)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
