//! Process access through procfs

use crate::core::types::{
    Address, AddressRange, MemoryError, MemoryResult, ProcessId, ProcessInfo, PAGE_SIZE,
};
use crate::linux::maps;
use crate::memory::regions::MemoryRegion;
use crate::process::ProcessAccess;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::os::unix::fs::FileExt;
use tracing::debug;

/// Lowest mappable address when `vm.mmap_min_addr` cannot be read
const DEFAULT_MIN_ADDRESS: u64 = 0x10000;

#[cfg(target_arch = "x86_64")]
const USER_SPACE_CEILING: u64 = 0x7FFF_FFFF_F000;
#[cfg(target_arch = "aarch64")]
const USER_SPACE_CEILING: u64 = 1 << 48;
#[cfg(all(
    target_pointer_width = "64",
    not(any(target_arch = "x86_64", target_arch = "aarch64"))
))]
const USER_SPACE_CEILING: u64 = 1 << 47;
#[cfg(target_pointer_width = "32")]
const USER_SPACE_CEILING: u64 = 0xC000_0000;

/// Open `/proc/<pid>/mem` and `/proc/<pid>/maps` files standing in for an
/// OS process handle. Both are closed when dropped.
#[derive(Debug)]
pub struct ProcFiles {
    pid: ProcessId,
    mem: Option<File>,
    maps: Option<File>,
}

impl ProcFiles {
    /// Opens the files the requested rights need
    pub fn open(pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        let unavailable = |e: io::Error| MemoryError::process_unavailable(pid, e.to_string());
        let root = format!("/proc/{}", pid);

        if pid == 0 || fs::metadata(&root).is_err() {
            return Err(MemoryError::process_unavailable(pid, "no such process"));
        }

        let read = access.contains(ProcessAccess::READ);
        let write = access.contains(ProcessAccess::WRITE);
        let mem = if read || write {
            let file = OpenOptions::new()
                .read(read)
                .write(write)
                .open(format!("{}/mem", root))
                .map_err(unavailable)?;
            Some(file)
        } else {
            None
        };

        let maps = if access.contains(ProcessAccess::QUERY) {
            Some(File::open(format!("{}/maps", root)).map_err(unavailable)?)
        } else {
            None
        };

        Ok(ProcFiles { pid, mem, maps })
    }

    fn mem(&self) -> MemoryResult<&File> {
        self.mem
            .as_ref()
            .ok_or_else(|| MemoryError::InvalidHandle("handle lacks memory access".to_string()))
    }

    pub fn address_range(&self) -> MemoryResult<AddressRange> {
        let minimum = fs::read_to_string("/proc/sys/vm/mmap_min_addr")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map_or(DEFAULT_MIN_ADDRESS, |min| min.max(PAGE_SIZE));
        Ok(AddressRange::new(
            Address::new(minimum),
            Address::new(USER_SPACE_CEILING),
        ))
    }

    /// Re-reads the maps file on every call; the layout may have changed
    pub fn query(&self, address: Address) -> MemoryResult<MemoryRegion> {
        let mut file = self
            .maps
            .as_ref()
            .ok_or_else(|| MemoryError::InvalidHandle("handle lacks query access".to_string()))?;

        let mut contents = String::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_string(&mut contents))
            .map_err(|e| MemoryError::process_unavailable(self.pid, e.to_string()))?;

        // A live process always has mappings; an empty file means it exited
        if contents.is_empty() {
            return Err(MemoryError::process_unavailable(self.pid, "process has no mappings"));
        }

        Ok(maps::region_containing(&contents, address.as_u64()))
    }

    pub fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        let file = self.mem()?;
        let mut total = 0;

        while total < buffer.len() {
            let offset = address.saturating_add(total as u64).as_u64();
            match file.read_at(&mut buffer[total..], offset) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if total == 0 => {
                    return Err(MemoryError::read_failed(address, buffer.len(), e.to_string()))
                }
                Err(e) => {
                    debug!(%address, total, error = %e, "short read");
                    break;
                }
            }
        }

        if total == 0 && !buffer.is_empty() {
            return Err(MemoryError::read_failed(
                address,
                buffer.len(),
                "no bytes transferred",
            ));
        }
        Ok(total)
    }

    pub fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        let file = self.mem()?;
        let mut total = 0;

        while total < data.len() {
            let offset = address.saturating_add(total as u64).as_u64();
            match file.write_at(&data[total..], offset) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if total == 0 => {
                    return Err(MemoryError::write_failed(address, data.len(), e.to_string()))
                }
                Err(_) => break,
            }
        }

        if total == 0 && !data.is_empty() {
            return Err(MemoryError::write_failed(
                address,
                data.len(),
                "no bytes transferred",
            ));
        }
        Ok(total)
    }
}

/// Live processes from the numeric entries of `/proc`. Entries that vanish
/// while being read are skipped.
pub fn list_processes() -> MemoryResult<Vec<ProcessInfo>> {
    let mut processes = Vec::new();

    for entry in fs::read_dir("/proc")? {
        let entry = entry?;
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<ProcessId>().ok())
        else {
            continue;
        };

        match fs::read_to_string(entry.path().join("comm")) {
            Ok(comm) => processes.push(ProcessInfo::new(pid, comm.trim_end())),
            Err(e) => debug!(pid, error = %e, "skipping process"),
        }
    }

    Ok(processes)
}
