//! KeyDir implementation
//!
//! HashMap from key to the offset of its live entry.

use std::collections::HashMap;

use crate::log::{Entry, Mark};

/// In-memory index of live keys
///
/// Not synchronized on its own; the store's lock guards it together with
/// the log it points into.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyDir {
    entries: HashMap<Vec<u8>, u64>,
}

impl KeyDir {
    /// Create a new empty KeyDir
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the live entry for `key`
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// Point `key` at `offset`, returning the previous offset
    pub fn insert(&mut self, key: Vec<u8>, offset: u64) -> Option<u64> {
        self.entries.insert(key, offset)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<u64> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the entry for `key` at `offset` is still the one the index uses
    pub fn is_live(&self, key: &[u8], offset: u64) -> bool {
        self.get(key) == Some(offset)
    }

    /// Apply one log entry found at `offset`: set inserts, delete removes
    pub fn apply(&mut self, entry: Entry, offset: u64) {
        match entry.mark {
            Mark::Set => {
                self.entries.insert(entry.key, offset);
            }
            Mark::Delete => {
                self.entries.remove(&entry.key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, offset)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        self.entries.iter().map(|(k, &off)| (k.as_slice(), off))
    }
}
