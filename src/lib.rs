//! Memory-Probe: process memory inspection engine
//!
//! Lists processes, reads and writes their memory, and scans their whole
//! address space for 32-bit values. The engine is synchronous and holds no
//! state between calls; [`binding`] exposes it as a JSON line protocol.

pub mod binding;
pub mod config;
pub mod core;
pub mod memory;
pub mod process;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    Address, AddressRange, MemoryError, MemoryResult, ProcessId, ProcessInfo, ScanReport,
    ScanStats, ValueInterpretation, VerifiedMatch,
};
pub use crate::core::{AUTHORS, VERSION};

pub use memory::MemoryOperations;
pub use process::{NativePlatform, Platform, ProcessAccess, ProcessMemory};
