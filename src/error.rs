//! Error types for CellKV
//!
//! Provides a unified error type for all operations.
//!
//! The store follows a three-valued outcome model: success, `MemFull`
//! (compaction ran but the reserved space still does not fit) and failure
//! (everything else). [`CellError::status`] collapses an error into that
//! model for callers that only care about the outcome class.

use thiserror::Error;

/// Result type alias using CellError
pub type Result<T> = std::result::Result<T, CellError>;

/// Unified error type for CellKV operations
#[derive(Debug, Error)]
pub enum CellError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Medium Errors
    // -------------------------------------------------------------------------
    #[error("offset {offset} is outside the medium (capacity {capacity})")]
    OutOfBounds { offset: usize, capacity: usize },

    #[error("commit failed: {0}")]
    CommitFailed(String),

    #[error("invalid medium capacity {capacity} (allowed: {min}..={max})")]
    InvalidCapacity {
        capacity: usize,
        min: usize,
        max: usize,
    },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("store not initialized, call begin() first")]
    NotInitialized,

    #[error("Key not found")]
    KeyNotFound,

    #[error("memory full: {required} bytes required, {available} available")]
    MemoryFull { required: usize, available: usize },

    #[error("compaction rewrite verification failed: expected crc {expected:#010x}, found {found:#010x}")]
    RewriteVerification { expected: u32, found: u32 },

    // -------------------------------------------------------------------------
    // Backup Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("backup corrupted: {0}")]
    BackupCorrupted(String),
}

impl CellError {
    /// Outcome class of this error.
    pub fn status(&self) -> Status {
        match self {
            CellError::MemoryFull { .. } => Status::MemFull,
            _ => Status::Failure,
        }
    }

    /// True when the error is the `MemFull` outcome.
    pub fn is_memory_full(&self) -> bool {
        matches!(self, CellError::MemoryFull { .. })
    }
}

impl From<bincode::Error> for CellError {
    fn from(e: bincode::Error) -> Self {
        CellError::Serialization(e.to_string())
    }
}

/// Outcome codes of the facade API
///
/// The numeric values are stable, so a dispatch layer can hand them across
/// an FFI or serial boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Failure = 0,
    Success = 1,
    MemFull = 2,
}

impl Status {
    /// Classify the result of any facade operation.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }
}
