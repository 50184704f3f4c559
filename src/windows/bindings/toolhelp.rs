//! Process enumeration using the ToolHelp32 snapshot API

use crate::core::types::{MemoryError, MemoryResult, ProcessInfo};
use crate::windows::types::Handle;
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
};

/// Iterator over a process snapshot, in snapshot order
pub struct ProcessEnumerator {
    snapshot: Handle,
    first_called: bool,
}

impl ProcessEnumerator {
    /// Takes a snapshot of the running processes
    pub fn new() -> MemoryResult<Self> {
        let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if raw.is_null() || raw == INVALID_HANDLE_VALUE {
            return Err(MemoryError::from(windows::core::Error::from_win32()));
        }
        Ok(ProcessEnumerator {
            snapshot: Handle::new(raw),
            first_called: false,
        })
    }

    fn next_process(&mut self) -> Option<ProcessInfo> {
        let mut entry: PROCESSENTRY32W = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

        let success = unsafe {
            if self.first_called {
                Process32NextW(self.snapshot.raw(), &mut entry)
            } else {
                self.first_called = true;
                Process32FirstW(self.snapshot.raw(), &mut entry)
            }
        };
        if success == FALSE {
            return None;
        }

        let name = &entry.szExeFile;
        let len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
        Some(ProcessInfo::new(
            entry.th32ProcessID,
            String::from_utf16_lossy(&name[..len]),
        ))
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_process()
    }
}
