//! Kernel32.dll bindings for process and memory operations

use crate::core::types::{Address, AddressRange, MemoryError, MemoryResult, ProcessId};
use crate::windows::utils::{ErrorCode, WinError};
use std::mem;
use winapi::shared::minwindef::{FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
use winapi::um::winnt::{HANDLE, MEMORY_BASIC_INFORMATION};

/// Safe wrapper for OpenProcess
pub fn open_process(pid: ProcessId, desired_access: u32) -> MemoryResult<HANDLE> {
    let handle = unsafe { OpenProcess(desired_access, FALSE, pid) };
    if handle.is_null() {
        Err(MemoryError::process_unavailable(pid, WinError::last().to_string()))
    } else {
        Ok(handle)
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle that is not used afterwards
pub unsafe fn close_handle(handle: HANDLE) -> Result<(), WinError> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(WinError::last())
    } else {
        Ok(())
    }
}

fn invalid_handle(error: &WinError) -> Option<MemoryError> {
    match error.code() {
        ErrorCode::InvalidHandle => Some(MemoryError::InvalidHandle(error.to_string())),
        _ => None,
    }
}

/// Safe wrapper for ReadProcessMemory. A partial copy that moved at least
/// one byte is returned as a short count.
///
/// # Safety
/// The handle must be a valid process handle
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: Address,
    buffer: &mut [u8],
) -> MemoryResult<usize> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address.to_usize()? as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result != FALSE {
        return Ok(bytes_read);
    }

    let error = WinError::last();
    if error.code() == ErrorCode::PartialCopy && bytes_read > 0 {
        return Ok(bytes_read);
    }
    Err(invalid_handle(&error)
        .unwrap_or_else(|| MemoryError::read_failed(address, buffer.len(), error.to_string())))
}

/// Safe wrapper for WriteProcessMemory
///
/// # Safety
/// The handle must be a valid process handle
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: Address,
    data: &[u8],
) -> MemoryResult<usize> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address.to_usize()? as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    if result != FALSE {
        return Ok(bytes_written);
    }

    let error = WinError::last();
    if error.code() == ErrorCode::PartialCopy && bytes_written > 0 {
        return Ok(bytes_written);
    }
    Err(invalid_handle(&error)
        .unwrap_or_else(|| MemoryError::write_failed(address, data.len(), error.to_string())))
}

/// Safe wrapper for VirtualQueryEx
///
/// # Safety
/// The handle must be a valid process handle
pub unsafe fn virtual_query_ex(
    handle: HANDLE,
    address: Address,
) -> MemoryResult<MEMORY_BASIC_INFORMATION> {
    let mut mbi: MEMORY_BASIC_INFORMATION = mem::zeroed();

    let result = VirtualQueryEx(
        handle,
        address.to_usize()? as LPCVOID,
        &mut mbi,
        mem::size_of::<MEMORY_BASIC_INFORMATION>(),
    );

    if result != 0 {
        return Ok(mbi);
    }

    // Access denied stays a per-region failure; the enumerator bounds the run
    let error = WinError::last();
    Err(invalid_handle(&error)
        .unwrap_or_else(|| MemoryError::query_failed(address, error.to_string())))
}

/// User-mode address range from GetSystemInfo, as a half-open range
pub fn application_address_range() -> AddressRange {
    let mut info: SYSTEM_INFO = unsafe { mem::zeroed() };
    unsafe { GetSystemInfo(&mut info) };

    AddressRange::new(
        Address::from(info.lpMinimumApplicationAddress as usize),
        Address::from(info.lpMaximumApplicationAddress as usize).saturating_add(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_null_handle_operations() {
        unsafe {
            assert!(close_handle(ptr::null_mut()).is_ok());

            let mut buffer = vec![0u8; 4];
            assert!(read_process_memory(ptr::null_mut(), Address::new(0x1000), &mut buffer).is_err());

            let data = vec![0u8; 4];
            assert!(write_process_memory(ptr::null_mut(), Address::new(0x1000), &data).is_err());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_invalid_process() {
        let result = open_process(0, 0x0010);
        assert!(matches!(
            result,
            Err(MemoryError::ProcessUnavailable { pid: 0, .. })
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_application_address_range() {
        let range = application_address_range();
        assert!(range.minimum.as_u64() > 0);
        assert!(range.maximum > range.minimum);
        assert!(range.maximum.is_aligned(0x1000));
    }
}
