//! Memory region model, enumeration and filtering
//!
//! A target's address space is walked as a sequence of [`MemoryRegion`]
//! descriptors. The enumerator produces them in ascending order, the filter
//! decides which ones the scanner is allowed to read.

pub mod enumerator;
pub mod filter;
pub mod protection;

pub use enumerator::{collect_regions, RegionEnumerator, DEFAULT_QUERY_FAILURE_LIMIT};
pub use filter::RegionFilter;
pub use protection::{Protection, RegionState};

use crate::core::types::Address;
use serde::{Deserialize, Serialize};

/// One contiguous range sharing a commit state and protection, as reported
/// by the OS at query time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub base: Address,
    pub size: u64,
    pub state: RegionState,
    pub protection: Protection,
}

impl MemoryRegion {
    pub fn new(base: Address, size: u64, state: RegionState, protection: Protection) -> Self {
        MemoryRegion {
            base,
            size,
            state,
            protection,
        }
    }

    /// A committed region with the given protection
    pub fn committed(base: Address, size: u64, protection: Protection) -> Self {
        Self::new(base, size, RegionState::Committed, protection)
    }

    /// An unallocated gap
    pub fn free(base: Address, size: u64) -> Self {
        Self::new(base, size, RegionState::Free, Protection::NO_ACCESS)
    }

    /// End of the region, `None` when it would pass the top of the address space
    pub fn end(&self) -> Option<Address> {
        self.base.checked_add(self.size)
    }

    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && self.end().map_or(true, |end| address < end)
    }

    pub fn is_committed(&self) -> bool {
        self.state == RegionState::Committed
    }
}
