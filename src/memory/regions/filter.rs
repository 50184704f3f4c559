//! Region eligibility for scanning

use crate::memory::regions::MemoryRegion;
use serde::{Deserialize, Serialize};

/// Predicate deciding which regions a scan may read.
///
/// The base rule always applies: the region must be committed and readable,
/// and neither a guard page nor no-access. The optional flags narrow it
/// further.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFilter {
    /// Accept writable regions only
    pub writable_only: bool,
    /// Accept executable regions only
    pub executable_only: bool,
}

impl RegionFilter {
    /// The base rule with no narrowing
    pub fn new() -> Self {
        RegionFilter::default()
    }

    /// Filter for writable regions only
    pub fn writable(mut self) -> Self {
        self.writable_only = true;
        self
    }

    /// Filter for executable regions only
    pub fn executable(mut self) -> Self {
        self.executable_only = true;
        self
    }

    /// Whether a region is eligible for scanning
    pub fn accepts(&self, region: &MemoryRegion) -> bool {
        if !is_scannable(region) {
            return false;
        }
        if self.writable_only && !region.protection.is_writable() {
            return false;
        }
        if self.executable_only && !region.protection.is_executable() {
            return false;
        }
        true
    }

    /// Apply the filter to a list of regions
    pub fn apply<'r>(&self, regions: &'r [MemoryRegion]) -> Vec<&'r MemoryRegion> {
        regions.iter().filter(|r| self.accepts(r)).collect()
    }
}

/// The base eligibility rule
pub fn is_scannable(region: &MemoryRegion) -> bool {
    let protection = region.protection;
    region.is_committed()
        && protection.is_readable()
        && !protection.is_guard()
        && !protection.is_no_access()
}
