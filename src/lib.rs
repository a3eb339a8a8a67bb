//! # caskkv
//!
//! An embeddable key-value store following the bitcask model:
//! - Append-only binary log holding every set and delete
//! - In-memory hash index from key to the offset of its live entry
//! - Recovery by replaying the log at open
//! - Merge to reclaim space from overwritten and deleted keys
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                               │
//! │             set / get / del / merge (RwLock)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   KeyDir    │─offset──▶│   LogFile   │
//!   │ (HashMap)   │          │  (bt.kv)    │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use caskkv::Store;
//!
//! let store = Store::open_path("./data")?;
//! store.set(b"hello", b"world")?;
//! assert_eq!(store.get(b"hello")?, Some(b"world".to_vec()));
//! store.del(b"hello")?;
//! store.merge()?;
//! # Ok::<(), caskkv::CaskError>(())
//! ```

// Merge renames the new log over the open one, which needs POSIX semantics
#[cfg(not(unix))]
compile_error!("caskkv only supports unix platforms");

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod index;
pub mod merge;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, SyncStrategy};
pub use merge::MergeStats;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of caskkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
