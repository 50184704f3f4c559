//! Error taxonomy for memory operations

use super::{Address, ProcessId};
use thiserror::Error;

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Process {pid} is unavailable: {reason}")]
    ProcessUnavailable { pid: ProcessId, reason: String },

    #[error("Failed to read {size} bytes at {address}: {reason}")]
    ReadFailed {
        address: Address,
        size: usize,
        reason: String,
    },

    #[error("Failed to write {size} bytes at {address}: {reason}")]
    WriteFailed {
        address: Address,
        size: usize,
        reason: String,
    },

    #[error("Partial write at {address}: requested {requested} bytes, wrote {written} bytes")]
    PartialWrite {
        address: Address,
        requested: usize,
        written: usize,
    },

    #[error("Failed to allocate a buffer of {size} bytes")]
    AllocationFailed { size: usize },

    #[error("Size too large: requested {requested} bytes, maximum is {limit} bytes")]
    SizeLimitExceeded { requested: usize, limit: usize },

    #[error("Failed to query memory region at {address}: {reason}")]
    QueryFailed { address: Address, reason: String },

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates a process unavailable error
    pub fn process_unavailable(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::ProcessUnavailable {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: Address, size: usize, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address,
            size,
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: Address, size: usize, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address,
            size,
            reason: reason.into(),
        }
    }

    /// Creates a query failed error
    pub fn query_failed(address: Address, reason: impl Into<String>) -> Self {
        MemoryError::QueryFailed {
            address,
            reason: reason.into(),
        }
    }

    /// Stable taxonomy name surfaced to callers of the binding layer
    pub fn kind(&self) -> &'static str {
        match self {
            MemoryError::ProcessUnavailable { .. } => "ProcessUnavailable",
            MemoryError::ReadFailed { .. } => "ReadFailed",
            MemoryError::WriteFailed { .. } => "WriteFailed",
            MemoryError::PartialWrite { .. } => "PartialWrite",
            MemoryError::AllocationFailed { .. } => "AllocationFailed",
            MemoryError::SizeLimitExceeded { .. } => "SizeLimitExceeded",
            MemoryError::QueryFailed { .. } => "QueryFailed",
            MemoryError::InvalidHandle(_) => "InvalidHandle",
            MemoryError::InvalidAddress(_) => "InvalidAddress",
            #[cfg(windows)]
            MemoryError::WindowsApiError(_) => "OsError",
            MemoryError::IoError(_) => "OsError",
        }
    }

    /// Whether this error must stop an address-space walk instead of being
    /// recorded and skipped.
    pub fn is_fatal_for_scan(&self) -> bool {
        matches!(
            self,
            MemoryError::ProcessUnavailable { .. }
                | MemoryError::InvalidHandle(_)
                | MemoryError::AllocationFailed { .. }
        )
    }
}
