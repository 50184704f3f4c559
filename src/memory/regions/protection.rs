//! Region protection and commit-state translation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page protection as a small bit-set, independent of the OS encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Protection {
    bits: u8,
}

impl Protection {
    pub const NONE: Self = Self { bits: 0 };
    pub const READ: Self = Self { bits: 0x01 };
    pub const WRITE: Self = Self { bits: 0x02 };
    pub const EXECUTE: Self = Self { bits: 0x04 };
    pub const GUARD: Self = Self { bits: 0x08 };
    pub const NO_ACCESS: Self = Self { bits: 0x10 };

    // Windows PAGE_* constants
    pub const PAGE_NOACCESS: u32 = 0x01;
    pub const PAGE_READONLY: u32 = 0x02;
    pub const PAGE_READWRITE: u32 = 0x04;
    pub const PAGE_WRITECOPY: u32 = 0x08;
    pub const PAGE_EXECUTE: u32 = 0x10;
    pub const PAGE_EXECUTE_READ: u32 = 0x20;
    pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
    pub const PAGE_EXECUTE_WRITECOPY: u32 = 0x80;
    pub const PAGE_GUARD: u32 = 0x100;

    /// Read-write protection
    pub const fn read_write() -> Self {
        Self {
            bits: Self::READ.bits | Self::WRITE.bits,
        }
    }

    /// Execute-read protection
    pub const fn read_execute() -> Self {
        Self {
            bits: Self::READ.bits | Self::EXECUTE.bits,
        }
    }

    /// Translates a Windows `PAGE_*` protection value. Modifier bits other
    /// than `PAGE_GUARD` (no-cache, write-combine) are ignored.
    pub fn from_windows(value: u32) -> Self {
        let base = match value & 0xFF {
            Self::PAGE_NOACCESS => Self::NO_ACCESS,
            Self::PAGE_READONLY => Self::READ,
            Self::PAGE_READWRITE | Self::PAGE_WRITECOPY => Self::read_write(),
            Self::PAGE_EXECUTE => Self::EXECUTE,
            Self::PAGE_EXECUTE_READ => Self::read_execute(),
            Self::PAGE_EXECUTE_READWRITE | Self::PAGE_EXECUTE_WRITECOPY => {
                Self::read_write() | Self::EXECUTE
            }
            _ => Self::NONE,
        };

        if value & Self::PAGE_GUARD != 0 {
            base | Self::GUARD
        } else {
            base
        }
    }

    /// Translates the permission column of `/proc/<pid>/maps`, e.g. `"r-xp"`.
    /// A mapping with none of `rwx` is treated as no-access.
    pub fn from_maps_perms(perms: &str) -> Self {
        let mut protection = Self::NONE;
        for (index, flag) in perms.chars().take(3).enumerate() {
            protection = match (index, flag) {
                (0, 'r') => protection | Self::READ,
                (1, 'w') => protection | Self::WRITE,
                (2, 'x') => protection | Self::EXECUTE,
                _ => protection,
            };
        }

        if protection.is_empty() {
            Self::NO_ACCESS
        } else {
            protection
        }
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub const fn is_readable(&self) -> bool {
        self.contains(Self::READ)
    }

    pub const fn is_writable(&self) -> bool {
        self.contains(Self::WRITE)
    }

    pub const fn is_executable(&self) -> bool {
        self.contains(Self::EXECUTE)
    }

    pub const fn is_guard(&self) -> bool {
        self.contains(Self::GUARD)
    }

    pub const fn is_no_access(&self) -> bool {
        self.contains(Self::NO_ACCESS)
    }
}

impl std::ops::BitOr for Protection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_no_access() {
            return write!(f, "NOACCESS");
        }

        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.is_readable(), 'r'),
            flag(self.is_writable(), 'w'),
            flag(self.is_executable(), 'x')
        )?;
        if self.is_guard() {
            write!(f, "+G")?;
        }
        Ok(())
    }
}

/// Commit state of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionState {
    /// Backed by storage and accessible subject to protection
    Committed,
    /// Address space reserved without backing storage
    Reserved,
    /// Unallocated address space
    Free,
}

impl RegionState {
    pub const MEM_COMMIT: u32 = 0x1000;
    pub const MEM_RESERVE: u32 = 0x2000;
    pub const MEM_FREE: u32 = 0x10000;

    /// Translates a Windows `MEM_*` state value
    pub fn from_windows(value: u32) -> Self {
        match value {
            Self::MEM_COMMIT => RegionState::Committed,
            Self::MEM_RESERVE => RegionState::Reserved,
            _ => RegionState::Free,
        }
    }
}
