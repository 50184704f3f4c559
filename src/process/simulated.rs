//! In-memory address spaces for driving the engine without an OS target
//!
//! A [`SimulatedSpace`] is built region by region and can be told to fail
//! queries or reads at chosen regions, to report a zero-size region, or to
//! invalidate its handles after a number of queries. [`SimulatedPlatform`]
//! hosts any number of such spaces under process ids and counts the handles
//! it hands out.

use crate::core::types::{Address, AddressRange, MemoryError, MemoryResult, ProcessId, ProcessInfo};
use crate::memory::regions::{MemoryRegion, Protection, RegionState};
use crate::process::{Platform, ProcessAccess, ProcessMemory};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct SimRegion {
    base: u64,
    size: u64,
    state: RegionState,
    protection: Protection,
    bytes: Vec<u8>,
}

impl SimRegion {
    fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    fn descriptor(&self) -> MemoryRegion {
        MemoryRegion::new(Address::new(self.base), self.size, self.state, self.protection)
    }

    fn readable(&self) -> bool {
        self.state == RegionState::Committed
            && self.protection.is_readable()
            && !self.protection.is_guard()
    }

    fn writable(&self) -> bool {
        self.state == RegionState::Committed && self.protection.is_writable()
    }
}

/// Builder for one simulated address space
#[derive(Debug, Clone)]
pub struct SimulatedSpace {
    range: AddressRange,
    regions: Vec<SimRegion>,
    failing_queries: HashSet<u64>,
    failing_reads: HashSet<u64>,
    zero_size: HashSet<u64>,
    invalidate_after: Option<usize>,
}

impl SimulatedSpace {
    /// An empty space covering `[minimum, maximum)`
    pub fn new(minimum: u64, maximum: u64) -> Self {
        SimulatedSpace {
            range: AddressRange::new(Address::new(minimum), Address::new(maximum)),
            regions: Vec::new(),
            failing_queries: HashSet::new(),
            failing_reads: HashSet::new(),
            zero_size: HashSet::new(),
            invalidate_after: None,
        }
    }

    fn insert(mut self, region: SimRegion) -> Self {
        let overlaps = self
            .regions
            .iter()
            .any(|r| region.base < r.end() && r.base < region.end());
        assert!(!overlaps, "simulated regions must not overlap");
        let at = self.regions.partition_point(|r| r.base < region.base);
        self.regions.insert(at, region);
        self
    }

    /// Adds a committed region holding `bytes`
    pub fn committed(self, base: u64, bytes: Vec<u8>, protection: Protection) -> Self {
        let size = bytes.len() as u64;
        self.insert(SimRegion {
            base,
            size,
            state: RegionState::Committed,
            protection,
            bytes,
        })
    }

    /// Adds a committed region that reports `size` bytes but only backs the
    /// first `bytes.len()` of them. Reads past the backing stop short.
    pub fn committed_sparse(self, base: u64, size: u64, bytes: Vec<u8>, protection: Protection) -> Self {
        self.insert(SimRegion {
            base,
            size,
            state: RegionState::Committed,
            protection,
            bytes,
        })
    }

    /// Adds reserved, uncommitted address space
    pub fn reserved(self, base: u64, size: u64) -> Self {
        self.insert(SimRegion {
            base,
            size,
            state: RegionState::Reserved,
            protection: Protection::NO_ACCESS,
            bytes: Vec::new(),
        })
    }

    /// Queries landing inside the region starting at `base` fail
    pub fn failing_query(mut self, base: u64) -> Self {
        self.failing_queries.insert(base);
        self
    }

    /// Reads starting inside the region at `base` fail
    pub fn failing_read(mut self, base: u64) -> Self {
        self.failing_reads.insert(base);
        self
    }

    /// A query at exactly `address` reports a region of size zero
    pub fn zero_size_at(mut self, address: u64) -> Self {
        self.zero_size.insert(address);
        self
    }

    /// Handles stop working after `queries` successful queries
    pub fn invalidate_after(mut self, queries: usize) -> Self {
        self.invalidate_after = Some(queries);
        self
    }

    fn region_at(&self, address: u64) -> Option<&SimRegion> {
        self.regions.iter().find(|r| r.contains(address))
    }

    fn region_at_mut(&mut self, address: u64) -> Option<&mut SimRegion> {
        self.regions.iter_mut().find(|r| r.contains(address))
    }

    fn describe(&self, address: u64) -> MemoryResult<MemoryRegion> {
        if self.zero_size.contains(&address) {
            return Ok(MemoryRegion::free(Address::new(address), 0));
        }

        let mut gap_start = self.range.minimum.as_u64().min(address);
        for region in &self.regions {
            if region.contains(address) {
                if self.failing_queries.contains(&region.base) {
                    return Err(MemoryError::query_failed(
                        Address::new(address),
                        "simulated query failure",
                    ));
                }
                return Ok(region.descriptor());
            }
            if address < region.base {
                return Ok(MemoryRegion::free(
                    Address::new(gap_start),
                    region.base - gap_start,
                ));
            }
            gap_start = region.end();
        }
        Ok(MemoryRegion::free(
            Address::new(gap_start),
            u64::MAX - gap_start,
        ))
    }

    fn read(&self, address: u64, buffer: &mut [u8]) -> usize {
        let mut copied = 0;
        let mut cursor = address;

        while copied < buffer.len() {
            let Some(region) = self.region_at(cursor).filter(|r| r.readable()) else {
                break;
            };
            let offset = (cursor - region.base) as usize;
            let available = region.bytes.len().saturating_sub(offset);
            let n = available.min(buffer.len() - copied);
            buffer[copied..copied + n].copy_from_slice(&region.bytes[offset..offset + n]);
            copied += n;
            cursor += n as u64;

            if offset + n < region.bytes.len() || cursor != region.end() {
                break;
            }
        }
        copied
    }

    fn write(&mut self, address: u64, data: &[u8]) -> usize {
        let mut written = 0;
        let mut cursor = address;

        while written < data.len() {
            let Some(region) = self.region_at_mut(cursor).filter(|r| r.writable()) else {
                break;
            };
            let offset = (cursor - region.base) as usize;
            let available = region.bytes.len().saturating_sub(offset);
            let n = available.min(data.len() - written);
            region.bytes[offset..offset + n].copy_from_slice(&data[written..written + n]);
            written += n;
            cursor += n as u64;

            if offset + n < region.bytes.len() || cursor != region.end() {
                break;
            }
        }
        written
    }
}

#[derive(Debug)]
struct SimProcess {
    name: String,
    space: SimulatedSpace,
    read_calls: usize,
}

#[derive(Debug, Default)]
struct State {
    processes: BTreeMap<ProcessId, SimProcess>,
    open_handles: usize,
    handles_opened: usize,
}

/// A set of simulated processes sharing one handle table
#[derive(Debug, Clone, Default)]
pub struct SimulatedPlatform {
    state: Arc<Mutex<State>>,
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        SimulatedPlatform::default()
    }

    /// Registers a process
    pub fn with_process(self, pid: ProcessId, name: impl Into<String>, space: SimulatedSpace) -> Self {
        self.lock().processes.insert(
            pid,
            SimProcess {
                name: name.into(),
                space,
                read_calls: 0,
            },
        );
        self
    }

    /// Removes a process, as if it had exited
    pub fn kill(&self, pid: ProcessId) {
        self.lock().processes.remove(&pid);
    }

    /// Handles currently open
    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }

    /// Handles opened since creation
    pub fn handles_opened(&self) -> usize {
        self.lock().handles_opened
    }

    /// Read calls that reached the simulated process
    pub fn read_calls(&self, pid: ProcessId) -> usize {
        self.lock()
            .processes
            .get(&pid)
            .map_or(0, |p| p.read_calls)
    }

    /// Bytes currently stored at `address`, bypassing handles
    pub fn peek(&self, pid: ProcessId, address: u64, len: usize) -> Vec<u8> {
        let state = self.lock();
        let mut buffer = vec![0u8; len];
        let n = state
            .processes
            .get(&pid)
            .map_or(0, |p| p.space.read(address, &mut buffer));
        buffer.truncate(n);
        buffer
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Platform for SimulatedPlatform {
    type Handle = SimulatedHandle;

    fn open(&self, pid: ProcessId, access: ProcessAccess) -> MemoryResult<SimulatedHandle> {
        let mut state = self.lock();
        if !state.processes.contains_key(&pid) {
            return Err(MemoryError::process_unavailable(pid, "no such process"));
        }
        state.open_handles += 1;
        state.handles_opened += 1;
        drop(state);

        Ok(SimulatedHandle {
            platform: self.clone(),
            pid,
            access,
            queries: Mutex::new(0),
        })
    }

    fn list_processes(&self) -> MemoryResult<Vec<ProcessInfo>> {
        Ok(self
            .lock()
            .processes
            .iter()
            .map(|(pid, p)| ProcessInfo::new(*pid, p.name.clone()))
            .collect())
    }
}

/// Handle into a [`SimulatedPlatform`] process
#[derive(Debug)]
pub struct SimulatedHandle {
    platform: SimulatedPlatform,
    pid: ProcessId,
    access: ProcessAccess,
    queries: Mutex<usize>,
}

impl SimulatedHandle {
    fn require(&self, right: ProcessAccess, what: &str) -> MemoryResult<()> {
        if self.access.contains(right) {
            Ok(())
        } else {
            Err(MemoryError::InvalidHandle(format!(
                "handle lacks {} access",
                what
            )))
        }
    }

    fn with_process<T>(&self, f: impl FnOnce(&mut SimProcess) -> MemoryResult<T>) -> MemoryResult<T> {
        let mut state = self.platform.lock();
        match state.processes.get_mut(&self.pid) {
            Some(process) => f(process),
            None => Err(MemoryError::process_unavailable(self.pid, "process exited")),
        }
    }
}

impl ProcessMemory for SimulatedHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn address_range(&self) -> MemoryResult<AddressRange> {
        self.with_process(|p| Ok(p.space.range))
    }

    fn query(&self, address: Address) -> MemoryResult<MemoryRegion> {
        self.require(ProcessAccess::QUERY, "query")?;
        let mut queries = self.queries.lock().unwrap_or_else(PoisonError::into_inner);
        self.with_process(|p| {
            if p.space.invalidate_after.is_some_and(|limit| *queries >= limit) {
                return Err(MemoryError::InvalidHandle(
                    "simulated handle invalidated".to_string(),
                ));
            }
            *queries += 1;
            p.space.describe(address.as_u64())
        })
    }

    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        self.require(ProcessAccess::READ, "read")?;
        self.with_process(|p| {
            p.read_calls += 1;
            let start = address.as_u64();
            let failing = p
                .space
                .region_at(start)
                .is_some_and(|r| p.space.failing_reads.contains(&r.base));
            let n = if failing { 0 } else { p.space.read(start, buffer) };
            if n == 0 && !buffer.is_empty() {
                return Err(MemoryError::read_failed(
                    address,
                    buffer.len(),
                    "simulated read failure",
                ));
            }
            Ok(n)
        })
    }

    fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        self.require(ProcessAccess::WRITE, "write")?;
        self.with_process(|p| {
            let n = p.space.write(address.as_u64(), data);
            if n == 0 && !data.is_empty() {
                return Err(MemoryError::write_failed(
                    address,
                    data.len(),
                    "simulated write failure",
                ));
            }
            Ok(n)
        })
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        let mut state = self.platform.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}
