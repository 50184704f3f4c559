//! Engine operations against the test process itself

use memory_probe::core::types::{Address, MemoryError};
use memory_probe::memory::regions::collect_regions;
use memory_probe::process::{ProcessAccess, ProcessHandle};
use memory_probe::MemoryOperations;
use std::process;

/// A pid that is never handed out
const MISSING_PID: u32 = 0x7FFF_FFFE;

fn address_of<T>(value: &T) -> Address {
    Address::from(value as *const T as usize)
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_lists_current_process() {
    let ops = MemoryOperations::native();
    let processes = ops.list_processes().unwrap();
    assert!(processes.iter().any(|p| p.pid == process::id()));
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_write_then_read_round_trip() {
    let ops = MemoryOperations::native();
    let target = Box::new([0u8; 16]);
    let address = address_of(&*target);
    let data = [0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE];

    ops.write_memory(process::id(), address, &data).unwrap();
    let read = ops.read_memory(process::id(), address, data.len()).unwrap();
    assert_eq!(read, data.to_vec());

    let seen = unsafe { std::ptr::read_volatile(&*target) };
    assert_eq!(&seen[..8], &data);
    assert_eq!(&seen[8..], &[0u8; 8]);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_read_as_array_of_local() {
    let ops = MemoryOperations::native();
    let local: u64 = 0x0102_0304_0506_0708;
    let bytes = ops
        .read_memory_as_array(process::id(), address_of(&local), 8)
        .unwrap();
    assert_eq!(bytes, local.to_ne_bytes().to_vec());
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_self_scan_finds_written_value() {
    let ops = MemoryOperations::native();
    let marker: u32 = 0x5CA1_0000 | (process::id() & 0xFFFF);
    let slot = Box::new([0u32; 4]);
    let address = address_of(&slot[2]);

    ops.write_memory(process::id(), address, &marker.to_ne_bytes())
        .unwrap();
    let matches = ops.scan_memory_for_value(process::id(), marker).unwrap();

    assert!(
        matches.contains(&address),
        "{} missing from {} matches",
        address,
        matches.len()
    );
    assert!(matches.windows(2).all(|w| w[0] < w[1]));
    assert!(matches.iter().all(|a| a.is_aligned(4)));
    std::hint::black_box(&slot);
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_size_ceiling_enforced() {
    let ops = MemoryOperations::native();
    let local = [0u8; 2048];
    let err = ops
        .read_memory_as_array(process::id(), address_of(&local), 1025)
        .unwrap_err();
    assert!(matches!(
        err,
        MemoryError::SizeLimitExceeded {
            requested: 1025,
            limit: 1024
        }
    ));
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_nonexistent_process() {
    let ops = MemoryOperations::native();
    let address = Address::new(0x10000);

    for result in [
        ops.read_memory(MISSING_PID, address, 4).map(|_| ()),
        ops.read_memory_as_array(MISSING_PID, address, 4).map(|_| ()),
        ops.write_memory(MISSING_PID, address, &[1, 2, 3, 4]),
        ops.scan_memory_for_value(MISSING_PID, 1).map(|_| ()),
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "ProcessUnavailable", "{}", err);
    }
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_null_address_read_fails() {
    let ops = MemoryOperations::native();
    let err = ops.read_memory(process::id(), Address::null(), 8).unwrap_err();
    assert_eq!(err.kind(), "ReadFailed");
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_region_walk_covers_heap_allocation() {
    let value = Box::new(7u32);
    let address = address_of(&*value);
    let handle = ProcessHandle::open_for_scan(process::id()).unwrap();
    let regions = collect_regions(&handle).unwrap();

    assert!(regions.windows(2).all(|w| w[0].base < w[1].base));
    let region = regions
        .iter()
        .find(|r| r.contains(address))
        .expect("heap address inside some region");
    assert!(region.is_committed());
    assert!(region.protection.is_readable());
}

#[test]
#[cfg_attr(miri, ignore = "FFI not supported in Miri")]
fn test_handle_rights() {
    let access = ProcessAccess::combine(&[ProcessAccess::READ, ProcessAccess::QUERY]);
    let handle = ProcessHandle::open(process::id(), access).unwrap();
    assert_eq!(handle.access(), access);
    assert!(handle.to_string().contains(&process::id().to_string()));
}
