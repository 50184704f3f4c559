//! Address-space scan for 32-bit values

use crate::core::types::{Address, MemoryError, MemoryResult, ScanReport, ScanStats};
use crate::memory::reader::BoundedReader;
use crate::memory::regions::{
    MemoryRegion, RegionEnumerator, RegionFilter, DEFAULT_QUERY_FAILURE_LIMIT,
};
use crate::process::ProcessMemory;
use tracing::{debug, info, warn};

/// Default cap on bytes read from any single region (100 MiB)
pub const DEFAULT_REGION_READ_CEILING: usize = 100 * 1024 * 1024;

/// Options for memory scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Bytes read from any single region at most
    pub region_read_ceiling: usize,
    /// Stop after visiting this many regions
    pub max_regions: Option<usize>,
    /// End the walk after this many query failures in a row, 0 for never
    pub query_failure_limit: usize,
    /// Which regions to read
    pub filter: RegionFilter,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            region_read_ceiling: DEFAULT_REGION_READ_CEILING,
            max_regions: None,
            query_failure_limit: DEFAULT_QUERY_FAILURE_LIMIT,
            filter: RegionFilter::default(),
        }
    }
}

/// Walks a process's address space looking for a `u32`
pub struct MemoryScanner<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
    options: ScanOptions,
}

impl<'a, M: ProcessMemory + ?Sized> MemoryScanner<'a, M> {
    /// Create a new memory scanner
    pub fn new(memory: &'a M) -> Self {
        Self::with_options(memory, ScanOptions::default())
    }

    pub fn with_options(memory: &'a M, options: ScanOptions) -> Self {
        MemoryScanner { memory, options }
    }

    /// Scans every eligible region for `value` in native byte order.
    ///
    /// Query and read failures are logged, counted and skipped. The scan only
    /// fails as a whole when the handle or the process goes away, or when a
    /// buffer cannot be allocated. A long enough run of query failures ends
    /// the walk early; the matches found up to then are still returned.
    pub fn scan_u32(&self, value: u32) -> MemoryResult<ScanReport> {
        let needle = value.to_ne_bytes();
        let reader = BoundedReader::new(self.memory);
        let mut matches = Vec::new();
        let mut stats = ScanStats::default();

        let mut regions = RegionEnumerator::new(self.memory)?
            .with_failure_limit(self.options.query_failure_limit);

        for item in regions.by_ref() {
            if self
                .options
                .max_regions
                .is_some_and(|cap| stats.regions_visited >= cap)
            {
                stats.hit_region_limit = true;
                break;
            }
            stats.regions_visited += 1;

            let region = match item {
                Ok(region) => region,
                Err(e) if e.is_fatal_for_scan() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "skipping region that could not be queried");
                    stats.query_failures += 1;
                    continue;
                }
            };

            if !self.options.filter.accepts(&region) {
                stats.regions_skipped += 1;
                continue;
            }

            match self.scan_region(&reader, &region, &needle, &mut matches, &mut stats) {
                Ok(()) => stats.regions_scanned += 1,
                Err(e) if e.is_fatal_for_scan() => return Err(e),
                Err(e) => {
                    warn!(base = %region.base, size = region.size, error = %e, "skipping unreadable region");
                    stats.read_failures += 1;
                }
            }
        }
        stats.walk_abandoned = regions.abandoned();

        info!(
            pid = self.memory.pid(),
            value,
            matches = matches.len(),
            regions = stats.regions_visited,
            scanned = stats.regions_scanned,
            query_failures = stats.query_failures,
            read_failures = stats.read_failures,
            abandoned = stats.walk_abandoned,
            "scan complete"
        );
        Ok(ScanReport { matches, stats })
    }

    fn scan_region(
        &self,
        reader: &BoundedReader<'_, M>,
        region: &MemoryRegion,
        needle: &[u8; 4],
        matches: &mut Vec<Address>,
        stats: &mut ScanStats,
    ) -> MemoryResult<()> {
        let ceiling = self.options.region_read_ceiling as u64;
        if region.size > ceiling {
            debug!(base = %region.base, size = region.size, ceiling, "region truncated to ceiling");
            stats.regions_truncated += 1;
        }
        let size = usize::try_from(region.size.min(ceiling))
            .map_err(|_| MemoryError::AllocationFailed { size: usize::MAX })?;

        let outcome = reader.read(region.base, size)?;
        debug!(
            base = %region.base,
            requested = size,
            transferred = outcome.transferred(),
            "scanning region"
        );
        stats.bytes_scanned += outcome.transferred() as u64;
        matches.extend(find_aligned_u32(&outcome.bytes, region.base, needle));
        Ok(())
    }
}

/// Addresses of every 4-byte-aligned window of `bytes` equal to `needle`.
/// Offsets are relative to the start of the buffer; a trailing window
/// shorter than 4 bytes is ignored.
pub fn find_aligned_u32<'b>(
    bytes: &'b [u8],
    base: Address,
    needle: &'b [u8; 4],
) -> impl Iterator<Item = Address> + 'b {
    bytes
        .chunks_exact(4)
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(move |(index, _)| base.saturating_add(index as u64 * 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::regions::Protection;
    use crate::process::simulated::{SimulatedPlatform, SimulatedSpace};
    use crate::process::{Platform, ProcessAccess};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const PID: u32 = 3;
    const VALUE: u32 = 0x1234_5678;

    fn page_with(offsets: &[usize]) -> Vec<u8> {
        let mut page = vec![0u8; 0x1000];
        for &offset in offsets {
            page[offset..offset + 4].copy_from_slice(&VALUE.to_ne_bytes());
        }
        page
    }

    fn scan(space: SimulatedSpace, options: ScanOptions) -> MemoryResult<ScanReport> {
        let platform = SimulatedPlatform::new().with_process(PID, "t", space);
        let handle = platform.open(PID, ProcessAccess::scan())?;
        MemoryScanner::with_options(&handle, options).scan_u32(VALUE)
    }

    #[test]
    fn test_find_aligned_u32_ignores_unaligned_and_tail() {
        let needle = VALUE.to_ne_bytes();
        let mut bytes = vec![0u8; 14];
        bytes[4..8].copy_from_slice(&needle);
        bytes[9..13].copy_from_slice(&needle);

        let found: Vec<_> = find_aligned_u32(&bytes, Address::new(0x100), &needle).collect();
        assert_eq!(found, vec![Address::new(0x104)]);
    }

    #[test]
    fn test_matches_are_ascending_across_regions() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0x20, 0x8]), Protection::READ)
            .committed(0x20000, page_with(&[0xFFC]), Protection::read_write());
        let report = scan(space, ScanOptions::default()).unwrap();
        assert_eq!(
            report.matches,
            vec![
                Address::new(0x10008),
                Address::new(0x10020),
                Address::new(0x20FFC)
            ]
        );
        assert_eq!(report.stats.regions_scanned, 2);
        assert_eq!(report.stats.bytes_scanned, 0x2000);
    }

    #[test]
    fn test_ineligible_regions_are_not_read() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0]), Protection::NO_ACCESS)
            .committed(0x11000, page_with(&[0]), Protection::READ | Protection::GUARD)
            .reserved(0x12000, 0x1000)
            .committed(0x13000, page_with(&[4]), Protection::READ);
        let platform = SimulatedPlatform::new().with_process(PID, "t", space);
        let handle = platform.open(PID, ProcessAccess::scan()).unwrap();

        let report = MemoryScanner::new(&handle).scan_u32(VALUE).unwrap();
        assert_eq!(report.matches, vec![Address::new(0x13004)]);
        assert_eq!(platform.read_calls(PID), 1);
    }

    #[test]
    fn test_ceiling_caps_region_read() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0x10, 0x800]), Protection::READ);
        let options = ScanOptions {
            region_read_ceiling: 0x100,
            ..Default::default()
        };
        let report = scan(space, options).unwrap();
        assert_eq!(report.matches, vec![Address::new(0x10010)]);
        assert_eq!(report.stats.regions_truncated, 1);
        assert_eq!(report.stats.bytes_scanned, 0x100);
    }

    #[test]
    fn test_short_region_read_advances_by_region_size() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed_sparse(0x10000, 0x4000, page_with(&[0x40]), Protection::READ)
            .committed(0x14000, page_with(&[0]), Protection::READ);
        let report = scan(space, ScanOptions::default()).unwrap();
        assert_eq!(
            report.matches,
            vec![Address::new(0x10040), Address::new(0x14000)]
        );
        assert_eq!(report.stats.read_failures, 0);
    }

    #[test]
    fn test_region_cap_stops_walk() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0]), Protection::READ)
            .committed(0x30000, page_with(&[0]), Protection::READ);
        let options = ScanOptions {
            max_regions: Some(1),
            ..Default::default()
        };
        let report = scan(space, options).unwrap();
        assert_eq!(report.matches, vec![Address::new(0x10000)]);
        assert!(report.stats.hit_region_limit);
        assert_eq!(report.stats.regions_visited, 1);
    }

    #[test]
    fn test_writable_only_filter() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0]), Protection::READ)
            .committed(0x20000, page_with(&[0]), Protection::read_write());
        let options = ScanOptions {
            filter: RegionFilter::new().writable(),
            ..Default::default()
        };
        let report = scan(space, options).unwrap();
        assert_eq!(report.matches, vec![Address::new(0x20000)]);
    }

    #[test]
    fn test_invalid_handle_aborts_scan() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0]), Protection::READ)
            .invalidate_after(1);
        let err = scan(space, ScanOptions::default()).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidHandle(_)));
    }

    #[test]
    fn test_failure_run_ends_scan_with_partial_matches() {
        let mut unqueryable = vec![0u8; 0x10000];
        unqueryable[0x40..0x44].copy_from_slice(&VALUE.to_ne_bytes());
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0x10]), Protection::READ)
            .committed(0x11000, unqueryable, Protection::READ)
            .failing_query(0x11000)
            .committed(0x21000, page_with(&[0x20]), Protection::READ);
        let options = ScanOptions {
            query_failure_limit: 4,
            ..Default::default()
        };
        let report = scan(space, options).unwrap();
        assert_eq!(report.matches, vec![Address::new(0x10010)]);
        assert!(report.stats.walk_abandoned);
        assert_eq!(report.stats.query_failures, 4);
        assert!(report.had_failures());
    }

    #[test]
    fn test_short_failure_run_is_skipped() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, page_with(&[0x10]), Protection::READ)
            .committed(0x11000, vec![0u8; 0x3000], Protection::READ)
            .failing_query(0x11000)
            .committed(0x14000, page_with(&[0x20]), Protection::READ);
        let options = ScanOptions {
            query_failure_limit: 4,
            ..Default::default()
        };
        let report = scan(space, options).unwrap();
        assert_eq!(
            report.matches,
            vec![Address::new(0x10010), Address::new(0x14020)]
        );
        assert!(!report.stats.walk_abandoned);
        assert_eq!(report.stats.query_failures, 3);
    }

    #[test]
    fn test_value_absent() {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, vec![0xAB; 0x1000], Protection::READ);
        let report = scan(space, ScanOptions::default()).unwrap();
        assert!(report.is_empty());
        assert!(!report.had_failures());
    }

    proptest! {
        #[test]
        fn prop_match_pass_agrees_with_naive_search(
            bytes in proptest::collection::vec(any::<u8>(), 0..256),
            needle in any::<[u8; 4]>(),
            base in 0u64..0x1_0000_0000,
        ) {
            let expected: Vec<Address> = (0..bytes.len() / 4)
                .filter(|i| bytes[i * 4..i * 4 + 4] == needle)
                .map(|i| Address::new(base + i as u64 * 4))
                .collect();
            let found: Vec<Address> = find_aligned_u32(&bytes, Address::new(base), &needle).collect();
            prop_assert_eq!(found, expected);
        }
    }
}
