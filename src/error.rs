//! Error types for caskkv
//!
//! Provides a unified error type for all operations.
//!
//! Reaching the end of a log file is not an error: `LogFile::read` returns
//! `Ok(None)` there, and scans simply stop.

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for caskkv operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    /// An entry header or payload runs past the end of the file
    #[error("Truncated entry at offset {offset}")]
    TruncatedEntry { offset: u64 },

    /// Bytes at `offset` do not form a valid entry
    #[error("Corrupt entry at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    /// Key or value length does not fit the u32 size fields of the header
    #[error("Entry too large: {0} bytes")]
    EntryTooLarge(usize),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    /// Only returned when `Config::reject_empty_keys` is enabled
    #[error("Empty key")]
    EmptyKey,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
