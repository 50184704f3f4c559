//! Process enumeration

use crate::core::types::{MemoryResult, ProcessInfo};

#[cfg(windows)]
pub use crate::windows::bindings::toolhelp::ProcessEnumerator;

/// Enumerate all running processes, in OS enumeration order
#[cfg(windows)]
pub fn enumerate_processes() -> MemoryResult<Vec<ProcessInfo>> {
    Ok(ProcessEnumerator::new()?.collect())
}

/// Enumerate all running processes, in OS enumeration order
#[cfg(target_os = "linux")]
pub fn enumerate_processes() -> MemoryResult<Vec<ProcessInfo>> {
    crate::linux::list_processes()
}

/// Find processes by name (case-insensitive)
pub fn find_processes_by_name(name: &str) -> MemoryResult<Vec<ProcessInfo>> {
    let processes = enumerate_processes()?;
    Ok(processes
        .into_iter()
        .filter(|p| p.name_matches(name))
        .collect())
}
