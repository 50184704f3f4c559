//! Memory writes that must transfer the whole buffer

use crate::core::types::{Address, MemoryError, MemoryResult};
use crate::process::ProcessMemory;

/// Writer for raw byte buffers
pub struct MemoryWriter<'a, M: ProcessMemory + ?Sized> {
    memory: &'a M,
}

impl<'a, M: ProcessMemory + ?Sized> MemoryWriter<'a, M> {
    /// Create a new memory writer
    pub fn new(memory: &'a M) -> Self {
        MemoryWriter { memory }
    }

    /// Writes all of `data` at `address`. Fails with `WriteFailed` when the
    /// OS rejects the write and with `PartialWrite` when fewer bytes landed.
    /// Nothing is retried.
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let written = self.memory.write_from(address, data)?;
        if written != data.len() {
            return Err(MemoryError::PartialWrite {
                address,
                requested: data.len(),
                written,
            });
        }

        Ok(())
    }

    /// Writes a native-endian `u32`
    pub fn write_u32(&self, address: Address, value: u32) -> MemoryResult<()> {
        self.write_bytes(address, &value.to_ne_bytes())
    }
}
