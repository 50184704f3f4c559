//! Owned HANDLE closed on drop

use crate::windows::bindings::kernel32;
use winapi::um::winnt::HANDLE;

/// A kernel handle owned by this process, closed exactly once when dropped
pub struct Handle {
    handle: HANDLE,
}

impl Handle {
    /// Takes ownership of a raw handle
    pub fn new(handle: HANDLE) -> Self {
        Handle { handle }
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// Get the raw handle
    pub fn raw(&self) -> HANDLE {
        self.handle
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                if let Err(e) = kernel32::close_handle(self.handle) {
                    tracing::warn!(error = %e, "CloseHandle failed");
                }
            }
        }
    }
}

// Process handles are usable from any thread of the owning process
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}
