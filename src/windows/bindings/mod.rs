//! Windows API bindings
//!
//! Low-level FFI wrappers. Every unsafe call of the backend lives here.

pub mod kernel32;
pub mod toolhelp;
