//! Windows backend
//!
//! Provides safe wrappers around the Windows API functions the engine
//! needs. All unsafe FFI calls are contained within `bindings`.

pub mod bindings;
pub mod types;
pub mod utils;

pub use types::Handle;
pub use utils::{ErrorCode, WinError};

use crate::core::types::{Address, AddressRange, MemoryResult, ProcessId};
use crate::memory::regions::{MemoryRegion, Protection, RegionState};
use crate::process::ProcessAccess;
use bindings::kernel32;

/// An OpenProcess handle
pub struct WindowsProcess {
    handle: Handle,
}

impl WindowsProcess {
    pub fn open(pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        let raw = kernel32::open_process(pid, access.value())?;
        Ok(WindowsProcess {
            handle: Handle::new(raw),
        })
    }

    pub fn address_range(&self) -> MemoryResult<AddressRange> {
        Ok(kernel32::application_address_range())
    }

    pub fn query(&self, address: Address) -> MemoryResult<MemoryRegion> {
        let mbi = unsafe { kernel32::virtual_query_ex(self.handle.raw(), address)? };
        Ok(MemoryRegion::new(
            Address::from(mbi.BaseAddress as usize),
            mbi.RegionSize as u64,
            RegionState::from_windows(mbi.State),
            Protection::from_windows(mbi.Protect),
        ))
    }

    pub fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        unsafe { kernel32::read_process_memory(self.handle.raw(), address, buffer) }
    }

    pub fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        unsafe { kernel32::write_process_memory(self.handle.raw(), address, data) }
    }
}
