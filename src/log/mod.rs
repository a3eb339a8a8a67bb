//! Log Module
//!
//! The append-only data log the whole store lives in.
//!
//! ## Responsibilities
//! - Encode and decode entries (set records and delete tombstones)
//! - Append entries at a tracked offset
//! - Random reads by offset for lookups
//! - Sequential scans for replay and merge
//!
//! ## File Format (big-endian)
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Entry 1                                              │
//! │ ┌─────────────┬───────────────┬──────────┬─────┬───┐ │
//! │ │ KeySize (4) │ ValueSize (4) │ Mark (2) │ Key │Val│ │
//! │ └─────────────┴───────────────┴──────────┴─────┴───┘ │
//! ├──────────────────────────────────────────────────────┤
//! │ Entry 2                                              │
//! │ ...                                                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//! Mark is 0 for set, 1 for delete. A delete carries an empty value.

mod entry;
mod file;
mod fio;
mod scan;

pub use entry::{Entry, EntryHeader, Mark, HEADER_SIZE};
pub use file::LogFile;
pub use scan::LogIterator;
