//! Address-space walk over a target process

use crate::core::types::{Address, AddressRange, MemoryResult};
use crate::memory::regions::MemoryRegion;
use crate::process::ProcessMemory;
use tracing::{debug, trace, warn};

/// Query failures in a row after which a walk is abandoned
pub const DEFAULT_QUERY_FAILURE_LIMIT: usize = 256;

/// Lazy, finite walk over `[minimum, maximum)` of a process's address space.
///
/// Each item is the region containing the cursor. After a successful query
/// the cursor moves to `base + size`. When that would not move it forward
/// (a zero-size report, or a region ending at or before the cursor) and when
/// a query fails, the cursor moves to the next page boundary instead, so the
/// walk always terminates. Failed queries are yielded as `Err` for the caller
/// to record. Errors that invalidate the whole walk (handle gone, process
/// gone) are yielded once and end the iteration, as does a run of failed
/// queries reaching the failure limit.
pub struct RegionEnumerator<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
    cursor: Option<Address>,
    maximum: Address,
    consecutive_failures: usize,
    failure_limit: usize,
    abandoned: bool,
}

impl<'a, M: ProcessMemory + ?Sized> RegionEnumerator<'a, M> {
    /// Walks the full addressable range reported by the process
    pub fn new(memory: &'a M) -> MemoryResult<Self> {
        let range = memory.address_range()?;
        Ok(Self::with_range(memory, range))
    }

    /// Walks an explicit range
    pub fn with_range(memory: &'a M, range: AddressRange) -> Self {
        debug!(
            pid = memory.pid(),
            minimum = %range.minimum,
            maximum = %range.maximum,
            "walking address space"
        );
        RegionEnumerator {
            memory,
            cursor: Some(range.minimum),
            maximum: range.maximum,
            consecutive_failures: 0,
            failure_limit: DEFAULT_QUERY_FAILURE_LIMIT,
            abandoned: false,
        }
    }

    /// Ends the walk after `limit` query failures in a row. Zero means no limit.
    pub fn with_failure_limit(mut self, limit: usize) -> Self {
        self.failure_limit = limit;
        self
    }

    /// Current query position, `None` once the walk is over
    pub fn cursor(&self) -> Option<Address> {
        self.cursor.filter(|c| *c < self.maximum)
    }

    /// Whether the walk stopped early on a run of query failures
    pub fn abandoned(&self) -> bool {
        self.abandoned
    }

    fn advance(&mut self, current: Address, region: &MemoryRegion) {
        self.cursor = match region.end() {
            Some(end) if end > current => Some(end),
            Some(_) => {
                trace!(address = %current, size = region.size, "non-advancing region, stepping one page");
                current.next_page()
            }
            None => None,
        };
    }
}

impl<'a, M: ProcessMemory + ?Sized> Iterator for RegionEnumerator<'a, M> {
    type Item = MemoryResult<MemoryRegion>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor()?;

        match self.memory.query(current) {
            Ok(region) => {
                self.consecutive_failures = 0;
                self.advance(current, &region);
                Some(Ok(region))
            }
            Err(e) if e.is_fatal_for_scan() => {
                self.cursor = None;
                Some(Err(e))
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.failure_limit > 0 && self.consecutive_failures >= self.failure_limit {
                    warn!(
                        pid = self.memory.pid(),
                        address = %current,
                        failures = self.consecutive_failures,
                        "too many consecutive query failures, ending walk"
                    );
                    self.abandoned = true;
                    self.cursor = None;
                } else {
                    self.cursor = current.next_page();
                }
                Some(Err(e))
            }
        }
    }
}

/// Collects every region that could be queried, dropping query failures
pub fn collect_regions<M: ProcessMemory + ?Sized>(memory: &M) -> MemoryResult<Vec<MemoryRegion>> {
    let mut regions = Vec::new();
    for item in RegionEnumerator::new(memory)? {
        match item {
            Ok(region) => regions.push(region),
            Err(e) if e.is_fatal_for_scan() => return Err(e),
            Err(e) => warn!(error = %e, "region could not be queried"),
        }
    }
    Ok(regions)
}
