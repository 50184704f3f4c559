//! Bounded reads into freshly allocated buffers

use crate::core::types::{Address, MemoryError, MemoryResult};
use crate::process::ProcessMemory;
use tracing::debug;

/// Bytes returned by a read, together with how many were asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    pub bytes: Vec<u8>,
    pub requested: usize,
}

impl ReadOutcome {
    /// Number of bytes actually transferred
    pub fn transferred(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_short(&self) -> bool {
        self.bytes.len() < self.requested
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reader copying target memory into owned buffers. The returned buffer
/// never shares storage with anything else.
pub struct BoundedReader<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
}

impl<'a, M: ProcessMemory + ?Sized> BoundedReader<'a, M> {
    /// Create a new bounded reader
    pub fn new(memory: &'a M) -> Self {
        BoundedReader { memory }
    }

    /// Reads up to `size` bytes at `address`.
    ///
    /// The buffer is allocated fallibly and truncated to the transferred
    /// count. A short read is returned as is; `ReadFailed` means nothing was
    /// transferred.
    pub fn read(&self, address: Address, size: usize) -> MemoryResult<ReadOutcome> {
        if size == 0 {
            return Ok(ReadOutcome {
                bytes: Vec::new(),
                requested: 0,
            });
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| MemoryError::AllocationFailed { size })?;
        buffer.resize(size, 0);

        let transferred = self.memory.read_into(address, &mut buffer)?;
        if transferred < size {
            debug!(%address, requested = size, transferred, "short read");
            buffer.truncate(transferred);
            buffer.shrink_to_fit();
        }

        Ok(ReadOutcome {
            bytes: buffer,
            requested: size,
        })
    }

    /// Reads exactly `N` bytes, failing on a short read
    pub fn read_exact<const N: usize>(&self, address: Address) -> MemoryResult<[u8; N]> {
        let outcome = self.read(address, N)?;
        <[u8; N]>::try_from(outcome.bytes.as_slice()).map_err(|_| {
            MemoryError::read_failed(
                address,
                N,
                format!("only {} bytes transferred", outcome.transferred()),
            )
        })
    }

    /// Reads a native-endian `u32`
    pub fn read_u32(&self, address: Address) -> MemoryResult<u32> {
        self.read_exact::<4>(address).map(u32::from_ne_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::regions::Protection;
    use crate::process::simulated::{SimulatedPlatform, SimulatedSpace};
    use crate::process::{Platform, ProcessAccess};

    fn platform() -> SimulatedPlatform {
        let space = SimulatedSpace::new(0x10000, 0x40000)
            .committed(0x10000, (0..=255u8).cycle().take(0x1000).collect(), Protection::READ);
        SimulatedPlatform::new().with_process(5, "target", space)
    }

    #[test]
    fn test_full_read() {
        let platform = platform();
        let handle = platform.open(5, ProcessAccess::read()).unwrap();
        let outcome = BoundedReader::new(&handle).read(Address::new(0x10010), 4).unwrap();
        assert_eq!(outcome.bytes, vec![0x10, 0x11, 0x12, 0x13]);
        assert!(!outcome.is_short());
    }

    #[test]
    fn test_short_read_is_not_an_error() {
        let platform = platform();
        let handle = platform.open(5, ProcessAccess::read()).unwrap();
        let outcome = BoundedReader::new(&handle).read(Address::new(0x10FFC), 16).unwrap();
        assert_eq!(outcome.transferred(), 4);
        assert_eq!(outcome.requested, 16);
        assert!(outcome.is_short());
        assert_eq!(outcome.into_bytes(), vec![0xFC, 0xFD, 0xFE, 0xFF]);
    }

    #[test]
    fn test_unreadable_address_fails() {
        let platform = platform();
        let handle = platform.open(5, ProcessAccess::read()).unwrap();
        let err = BoundedReader::new(&handle).read(Address::new(0x30000), 4).unwrap_err();
        match err {
            MemoryError::ReadFailed { address, size, .. } => {
                assert_eq!(address, Address::new(0x30000));
                assert_eq!(size, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_size_read_skips_os_call() {
        let platform = platform();
        let handle = platform.open(5, ProcessAccess::read()).unwrap();
        let outcome = BoundedReader::new(&handle).read(Address::new(0x30000), 0).unwrap();
        assert!(outcome.bytes.is_empty());
        assert_eq!(platform.read_calls(5), 0);
    }

    #[test]
    fn test_huge_request_fails_allocation() {
        let platform = platform();
        let handle = platform.open(5, ProcessAccess::read()).unwrap();
        let err = BoundedReader::new(&handle)
            .read(Address::new(0x10000), usize::MAX)
            .unwrap_err();
        assert!(matches!(err, MemoryError::AllocationFailed { size: usize::MAX }));
        assert_eq!(platform.read_calls(5), 0);
    }

    #[test]
    fn test_read_u32() {
        let platform = platform();
        let handle = platform.open(5, ProcessAccess::read()).unwrap();
        let reader = BoundedReader::new(&handle);
        assert_eq!(
            reader.read_u32(Address::new(0x10004)).unwrap(),
            u32::from_ne_bytes([4, 5, 6, 7])
        );
        assert!(reader.read_u32(Address::new(0x10FFE)).is_err());
    }
}
