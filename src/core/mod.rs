//! Core module containing fundamental types for Memory-Probe
//!
//! This module provides the foundational building blocks used throughout
//! the engine, including address handling, process information, scan
//! results, and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, AddressRange, MemoryError, MemoryResult, ProcessId, ProcessInfo, ScanReport,
    ScanStats,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

// Platform verification at compile time
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
compile_error!("Memory-Probe only supports Windows and Linux platforms");

#[cfg(all(target_os = "windows", not(target_pointer_width = "64")))]
compile_error!("Memory-Probe requires a 64-bit build on Windows");
