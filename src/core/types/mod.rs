//! Core type definitions for Memory-Probe
//!
//! This module contains the fundamental types shared by every layer:
//! address wrappers, process information, scan results and error types.

mod address;
mod error;
mod process_info;
mod scan_result;
mod value;

// Re-export all public types
pub use address::{Address, AddressRange, PAGE_SIZE};
pub use error::{MemoryError, MemoryResult};
pub use process_info::ProcessInfo;
pub use scan_result::{ScanReport, ScanStats, VerifiedMatch};
pub use value::{raw_dump, ValueInterpretation};

// Common type aliases
pub type ProcessId = u32;
