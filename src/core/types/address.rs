//! Virtual address wrapper with hex parsing and checked arithmetic

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Page granularity used when the enumerator has to step over an address
/// it could not query.
pub const PAGE_SIZE: u64 = 0x1000;

/// An unsigned 64-bit offset into a target process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the address is aligned to the specified boundary
    pub const fn is_aligned(&self, alignment: u64) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }

    /// Aligns the address down to the specified power-of-two boundary
    pub const fn align_down(&self, alignment: u64) -> Self {
        if alignment == 0 {
            return *self;
        }
        Address(self.0 & !(alignment - 1))
    }

    /// Adds a byte count, returning `None` on overflow
    pub fn checked_add(&self, bytes: u64) -> Option<Self> {
        self.0.checked_add(bytes).map(Address)
    }

    /// Adds a byte count, clamping at the top of the address space
    pub fn saturating_add(&self, bytes: u64) -> Self {
        Address(self.0.saturating_add(bytes))
    }

    /// Start of the page following the one containing this address
    pub fn next_page(&self) -> Option<Self> {
        self.align_down(PAGE_SIZE).checked_add(PAGE_SIZE)
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the address as a pointer-sized integer, if it fits
    pub fn to_usize(&self) -> MemoryResult<usize> {
        usize::try_from(self.0).map_err(|_| {
            MemoryError::InvalidAddress(format!("{} does not fit the host pointer width", self))
        })
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if let Some(hex) = s.strip_prefix('$') {
            u64::from_str_radix(hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Assume hex if contains letters
            u64::from_str_radix(s, 16)
        } else {
            s.parse::<u64>()
        };

        value
            .map(Address::new)
            .map_err(|_| MemoryError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value as u64)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

// Addresses cross the binding boundary as plain integers so callers keep
// arithmetic on them; strings are accepted on the way in.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Address(value)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Half-open `[minimum, maximum)` range of addresses a process can map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub minimum: Address,
    pub maximum: Address,
}

impl AddressRange {
    pub const fn new(minimum: Address, maximum: Address) -> Self {
        AddressRange { minimum, maximum }
    }

    pub fn contains(&self, address: Address) -> bool {
        address >= self.minimum && address < self.maximum
    }

    pub fn len(&self) -> u64 {
        self.maximum.0.saturating_sub(self.minimum.0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
