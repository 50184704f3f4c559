//! Memory operations on foreign processes
//!
//! This module provides the engine's public operations:
//! - Process listing
//! - Bounded reads and verified writes
//! - Address-space scanning for 32-bit values
//!
//! Every operation opens its own handle and releases it before returning.

pub mod reader;
pub mod regions;
pub mod scanner;
pub mod writer;

pub use reader::{BoundedReader, ReadOutcome};
pub use scanner::{find_aligned_u32, MemoryScanner, ScanOptions, DEFAULT_REGION_READ_CEILING};
pub use writer::MemoryWriter;

use crate::config::Config;
use crate::core::types::{
    raw_dump, Address, MemoryError, MemoryResult, ProcessId, ProcessInfo, ScanReport,
    VerifiedMatch,
};
use crate::process::{NativePlatform, Platform, ProcessAccess};
use tracing::{debug, info};

/// Largest request `read_memory_as_array` accepts
pub const DEFAULT_ARRAY_READ_LIMIT: usize = 1024;

/// Entry point for list, read, write and scan operations over a platform
#[derive(Debug, Clone)]
pub struct MemoryOperations<P: Platform = NativePlatform> {
    platform: P,
    scan_options: ScanOptions,
    array_read_limit: usize,
    max_read_size: usize,
}

impl MemoryOperations<NativePlatform> {
    /// Operations against the host OS with default limits
    pub fn native() -> Self {
        Self::new(NativePlatform)
    }
}

impl<P: Platform> MemoryOperations<P> {
    /// Create new memory operations with default limits
    pub fn new(platform: P) -> Self {
        MemoryOperations {
            platform,
            scan_options: ScanOptions::default(),
            array_read_limit: DEFAULT_ARRAY_READ_LIMIT,
            max_read_size: DEFAULT_REGION_READ_CEILING,
        }
    }

    /// Create memory operations with limits taken from configuration
    pub fn with_config(platform: P, config: &Config) -> Self {
        MemoryOperations {
            platform,
            scan_options: config.scanner.scan_options(),
            array_read_limit: config.memory.array_read_limit,
            max_read_size: config.memory.max_read_size,
        }
    }

    /// Replace the scan options
    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn scan_options(&self) -> &ScanOptions {
        &self.scan_options
    }

    /// Live processes in OS enumeration order
    pub fn list_processes(&self) -> MemoryResult<Vec<ProcessInfo>> {
        let processes = self.platform.list_processes()?;
        debug!(count = processes.len(), "listed processes");
        Ok(processes)
    }

    /// Reads up to `size` bytes. The result is shorter than `size` when the
    /// range runs into unreadable memory after at least one byte.
    pub fn read_memory(
        &self,
        pid: ProcessId,
        address: Address,
        size: usize,
    ) -> MemoryResult<Vec<u8>> {
        check_limit(size, self.max_read_size)?;

        let handle = self.platform.open(pid, ProcessAccess::read())?;
        let outcome = BoundedReader::new(&handle).read(address, size)?;
        debug!(
            pid,
            %address,
            requested = size,
            transferred = outcome.transferred(),
            head = %raw_dump(&outcome.bytes[..outcome.bytes.len().min(16)]),
            "read memory"
        );
        Ok(outcome.into_bytes())
    }

    /// Like [`read_memory`](Self::read_memory) for small requests; sizes
    /// above the array limit are rejected before the process is opened
    pub fn read_memory_as_array(
        &self,
        pid: ProcessId,
        address: Address,
        size: usize,
    ) -> MemoryResult<Vec<u8>> {
        check_limit(size, self.array_read_limit)?;
        self.read_memory(pid, address, size)
    }

    /// Writes all of `bytes`, failing on any short write
    pub fn write_memory(&self, pid: ProcessId, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        let handle = self.platform.open(pid, ProcessAccess::write())?;
        MemoryWriter::new(&handle).write_bytes(address, bytes)?;
        info!(pid, %address, len = bytes.len(), "wrote memory");
        Ok(())
    }

    /// Addresses of every 4-byte-aligned occurrence of `value`, ascending
    pub fn scan_memory_for_value(&self, pid: ProcessId, value: u32) -> MemoryResult<Vec<Address>> {
        self.scan_report(pid, value).map(|report| report.matches)
    }

    /// Full scan result including walk statistics
    pub fn scan_report(&self, pid: ProcessId, value: u32) -> MemoryResult<ScanReport> {
        let handle = self.platform.open(pid, ProcessAccess::scan())?;
        MemoryScanner::with_options(&handle, self.scan_options.clone()).scan_u32(value)
    }

    /// Scans for `value`, then re-reads every match through the same handle
    /// to report what it holds now
    pub fn scan_and_verify(&self, pid: ProcessId, value: u32) -> MemoryResult<Vec<VerifiedMatch>> {
        let handle = self.platform.open(pid, ProcessAccess::scan())?;
        let report =
            MemoryScanner::with_options(&handle, self.scan_options.clone()).scan_u32(value)?;

        let reader = BoundedReader::new(&handle);
        let verified = report
            .matches
            .iter()
            .map(|&address| match reader.read(address, 4) {
                Ok(outcome) => VerifiedMatch::from_read(address, &outcome.bytes),
                Err(e) => {
                    debug!(%address, error = %e, "match no longer readable");
                    VerifiedMatch::from_read(address, &[])
                }
            })
            .collect();
        Ok(verified)
    }
}

fn check_limit(requested: usize, limit: usize) -> MemoryResult<()> {
    if requested > limit {
        return Err(MemoryError::SizeLimitExceeded { requested, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::regions::Protection;
    use crate::process::simulated::{SimulatedPlatform, SimulatedSpace};
    use pretty_assertions::assert_eq;

    const PID: ProcessId = 100;

    fn ops() -> MemoryOperations<SimulatedPlatform> {
        let space = SimulatedSpace::new(0x10000, 0x80000)
            .committed(0x10000, vec![0; 0x1000], Protection::read_write())
            .committed(0x20000, vec![0; 0x1000], Protection::READ);
        MemoryOperations::new(SimulatedPlatform::new().with_process(PID, "game.exe", space))
    }

    #[test]
    fn test_list_processes() {
        let ops = ops();
        assert_eq!(
            ops.list_processes().unwrap(),
            vec![ProcessInfo::new(PID, "game.exe")]
        );
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let ops = ops();
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
        ops.write_memory(PID, Address::new(0x10100), &data).unwrap();
        assert_eq!(
            ops.read_memory(PID, Address::new(0x10100), data.len()).unwrap(),
            data.to_vec()
        );
        assert_eq!(ops.platform().open_handles(), 0);
        assert_eq!(ops.platform().handles_opened(), 2);
    }

    #[test]
    fn test_array_limit_rejected_before_open() {
        let ops = ops();
        let err = ops
            .read_memory_as_array(PID, Address::new(0x10000), 1025)
            .unwrap_err();
        assert!(matches!(
            err,
            MemoryError::SizeLimitExceeded {
                requested: 1025,
                limit: 1024
            }
        ));
        assert_eq!(ops.platform().handles_opened(), 0);
        assert_eq!(ops.platform().read_calls(PID), 0);

        assert_eq!(
            ops.read_memory_as_array(PID, Address::new(0x10000), 1024)
                .unwrap()
                .len(),
            1024
        );
    }

    #[test]
    fn test_max_read_size_from_config() {
        let mut config = Config::default();
        config.memory.max_read_size = 64;
        config.memory.array_read_limit = 64;
        let ops = MemoryOperations::with_config(ops().platform().clone(), &config);

        assert!(matches!(
            ops.read_memory(PID, Address::new(0x10000), 65),
            Err(MemoryError::SizeLimitExceeded { limit: 64, .. })
        ));
        assert!(ops.read_memory(PID, Address::new(0x10000), 64).is_ok());
    }

    #[test]
    fn test_missing_process() {
        let ops = ops();
        assert!(matches!(
            ops.read_memory(7, Address::new(0x10000), 4),
            Err(MemoryError::ProcessUnavailable { pid: 7, .. })
        ));
        assert!(matches!(
            ops.write_memory(7, Address::new(0x10000), &[1]),
            Err(MemoryError::ProcessUnavailable { .. })
        ));
        assert!(matches!(
            ops.scan_memory_for_value(7, 1),
            Err(MemoryError::ProcessUnavailable { .. })
        ));
    }

    #[test]
    fn test_scan_finds_written_value() {
        let ops = ops();
        ops.write_memory(PID, Address::new(0x10FF0), &0xCAFEu32.to_ne_bytes())
            .unwrap();
        assert_eq!(
            ops.scan_memory_for_value(PID, 0xCAFE).unwrap(),
            vec![Address::new(0x10FF0)]
        );
        assert!(ops.scan_memory_for_value(PID, 0xBEEF).unwrap().is_empty());
        assert_eq!(ops.platform().open_handles(), 0);
    }

    #[test]
    fn test_scan_and_verify() {
        let ops = ops();
        ops.write_memory(PID, Address::new(0x10008), &(-5i32).to_ne_bytes())
            .unwrap();
        let verified = ops.scan_and_verify(PID, -5i32 as u32).unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].value, Some(-5));
        assert_eq!(verified[0].hex_address, "0x10008");
        assert!(verified[0].is_confirmed());
    }

    #[test]
    fn test_partial_write_surfaces() {
        let ops = ops();
        let err = ops
            .write_memory(PID, Address::new(0x10FFE), &[1, 2, 3, 4])
            .unwrap_err();
        assert_eq!(err.kind(), "PartialWrite");
    }
}
