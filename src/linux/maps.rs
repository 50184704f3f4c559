//! `/proc/<pid>/maps` parsing

use crate::core::types::Address;
use crate::memory::regions::{MemoryRegion, Protection};

/// One line of a maps file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapsEntry {
    pub start: u64,
    pub end: u64,
    pub perms: String,
    pub path: Option<String>,
}

impl MapsEntry {
    /// Parses `start-end perms offset dev inode [path]`
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let (start, end) = fields.next()?.split_once('-')?;
        let perms = fields.next()?.to_string();
        // offset, dev, inode
        let path = fields.nth(3).map(str::to_string);

        Some(MapsEntry {
            start: u64::from_str_radix(start, 16).ok()?,
            end: u64::from_str_radix(end, 16).ok()?,
            perms,
            path,
        })
    }

    pub fn protection(&self) -> Protection {
        Protection::from_maps_perms(&self.perms)
    }
}

/// Region containing `address`, given the maps file contents.
///
/// A mapping is reported as committed with its permissions. An address
/// between mappings is reported as the free gap around it, the gap after the
/// last mapping running to the top of the address space.
pub fn region_containing(maps: &str, address: u64) -> MemoryRegion {
    let mut gap_start = 0;

    for entry in maps.lines().filter_map(MapsEntry::parse) {
        if address < entry.start {
            return MemoryRegion::free(Address::new(gap_start), entry.start - gap_start);
        }
        if address < entry.end {
            return MemoryRegion::committed(
                Address::new(entry.start),
                entry.end - entry.start,
                entry.protection(),
            );
        }
        gap_start = entry.end;
    }

    MemoryRegion::free(Address::new(gap_start), u64::MAX - gap_start)
}
