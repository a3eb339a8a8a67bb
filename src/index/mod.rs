//! Index Module
//!
//! In-memory map from key to the byte offset of its live entry.
//!
//! ## Responsibilities
//! - Point each key at its most recent set entry in the active log
//! - Forget keys whose last entry is a tombstone
//! - Rebuild from the log by full sequential replay
//!
//! The index is never persisted. Replaying the active log from offset 0
//! always reproduces it exactly.

mod keydir;
mod replay;

pub use keydir::KeyDir;
pub use replay::{replay, ReplayResult};
