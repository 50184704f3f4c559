//! Process access layer
//!
//! This module provides the seam between the memory engine and the OS:
//! [`Platform`] opens processes and lists them, [`ProcessMemory`] is the
//! capability an opened process exposes. [`NativePlatform`] drives the real
//! OS, [`simulated::SimulatedPlatform`] an in-memory address space.

pub mod enumerator;
pub mod handle;
pub mod simulated;

pub use enumerator::enumerate_processes;
pub use handle::{ProcessAccess, ProcessHandle};

use crate::core::types::{Address, AddressRange, MemoryResult, ProcessId, ProcessInfo};
use crate::memory::regions::MemoryRegion;

/// Memory access through one opened process handle
pub trait ProcessMemory {
    /// Id of the process this handle refers to
    fn pid(&self) -> ProcessId;

    /// Range of addresses the process can map
    fn address_range(&self) -> MemoryResult<AddressRange>;

    /// Describes the region containing `address`
    fn query(&self, address: Address) -> MemoryResult<MemoryRegion>;

    /// Copies bytes starting at `address` into `buffer`, returning how many
    /// were transferred. A short count is not an error; zero transferred
    /// bytes is reported as `ReadFailed`.
    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize>;

    /// Copies `data` to `address`, returning how many bytes were transferred
    fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<usize>;
}

impl<M: ProcessMemory + ?Sized> ProcessMemory for &M {
    fn pid(&self) -> ProcessId {
        (**self).pid()
    }

    fn address_range(&self) -> MemoryResult<AddressRange> {
        (**self).address_range()
    }

    fn query(&self, address: Address) -> MemoryResult<MemoryRegion> {
        (**self).query(address)
    }

    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        (**self).read_into(address, buffer)
    }

    fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        (**self).write_from(address, data)
    }
}

/// Source of process handles
pub trait Platform {
    type Handle: ProcessMemory;

    /// Opens `pid` with the requested rights. Fails with
    /// `ProcessUnavailable` when the process does not exist or cannot be
    /// opened with those rights.
    fn open(&self, pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self::Handle>;

    /// Live processes in OS enumeration order
    fn list_processes(&self) -> MemoryResult<Vec<ProcessInfo>>;
}

/// The host operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlatform;

impl Platform for NativePlatform {
    type Handle = ProcessHandle;

    fn open(&self, pid: ProcessId, access: ProcessAccess) -> MemoryResult<ProcessHandle> {
        ProcessHandle::open(pid, access)
    }

    fn list_processes(&self) -> MemoryResult<Vec<ProcessInfo>> {
        enumerate_processes()
    }
}
