//! Safe process handle wrapper with RAII semantics

use crate::core::types::{Address, AddressRange, MemoryResult, ProcessId};
use crate::memory::regions::MemoryRegion;
use crate::process::ProcessMemory;
use std::fmt;
use tracing::trace;

#[cfg(windows)]
use crate::windows::WindowsProcess as OsProcess;

#[cfg(target_os = "linux")]
use crate::linux::ProcFiles as OsProcess;

/// Access rights for process handles. Bit values follow the Windows
/// `PROCESS_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// Modify the address space (required alongside WRITE)
    pub const OPERATION: Self = Self { value: 0x0008 };
    /// Read memory
    pub const READ: Self = Self { value: 0x0010 };
    /// Write memory
    pub const WRITE: Self = Self { value: 0x0020 };
    /// Query region information
    pub const QUERY: Self = Self { value: 0x0400 };

    /// Combine access rights
    pub fn combine(rights: &[Self]) -> Self {
        let mut value = 0;
        for right in rights {
            value |= right.value;
        }
        Self { value }
    }

    /// Rights for a direct read
    pub fn read() -> Self {
        Self::READ
    }

    /// Rights for a direct write
    pub fn write() -> Self {
        Self::combine(&[Self::WRITE, Self::OPERATION])
    }

    /// Rights for an address-space scan
    pub fn scan() -> Self {
        Self::combine(&[Self::READ, Self::QUERY])
    }

    pub fn contains(&self, other: Self) -> bool {
        self.value & other.value == other.value
    }

    /// Get raw value
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Access handle to one process, released exactly once when dropped
pub struct ProcessHandle {
    inner: OsProcess,
    pid: ProcessId,
    access: ProcessAccess,
}

impl ProcessHandle {
    /// Open a process with specified access rights
    pub fn open(pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        let inner = OsProcess::open(pid, access)?;
        trace!(pid, access = access.value(), "opened process handle");
        Ok(ProcessHandle { inner, pid, access })
    }

    /// Open a process for reading memory
    pub fn open_for_read(pid: ProcessId) -> MemoryResult<Self> {
        Self::open(pid, ProcessAccess::read())
    }

    /// Open a process for writing memory
    pub fn open_for_write(pid: ProcessId) -> MemoryResult<Self> {
        Self::open(pid, ProcessAccess::write())
    }

    /// Open a process for walking and reading its address space
    pub fn open_for_scan(pid: ProcessId) -> MemoryResult<Self> {
        Self::open(pid, ProcessAccess::scan())
    }

    /// Get the access rights
    pub fn access(&self) -> ProcessAccess {
        self.access
    }
}

impl ProcessMemory for ProcessHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn address_range(&self) -> MemoryResult<AddressRange> {
        self.inner.address_range()
    }

    fn query(&self, address: Address) -> MemoryResult<MemoryRegion> {
        self.inner.query(address)
    }

    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        self.inner.read_into(address, buffer)
    }

    fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        self.inner.write_from(address, data)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        trace!(pid = self.pid, "releasing process handle");
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessHandle(pid={})", self.pid)
    }
}
