//! Windows error code handling utilities

use std::fmt;
use windows::core::HRESULT;
use winapi::um::errhandlingapi::GetLastError;

/// Windows error codes the backend reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    AccessDenied,
    InvalidHandle,
    InvalidParameter,
    PartialCopy,
    InvalidAddress,
    Other(u32),
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            5 => ErrorCode::AccessDenied,
            6 => ErrorCode::InvalidHandle,
            87 => ErrorCode::InvalidParameter,
            299 => ErrorCode::PartialCopy,
            487 => ErrorCode::InvalidAddress,
            _ => ErrorCode::Other(code),
        }
    }
}

impl ErrorCode {
    pub fn raw(&self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::AccessDenied => 5,
            ErrorCode::InvalidHandle => 6,
            ErrorCode::InvalidParameter => 87,
            ErrorCode::PartialCopy => 299,
            ErrorCode::InvalidAddress => 487,
            ErrorCode::Other(code) => *code,
        }
    }
}

/// Last OS error of the calling thread with its system message
#[derive(Debug, Clone)]
pub struct WinError {
    code: ErrorCode,
    message: String,
}

impl WinError {
    /// Captures `GetLastError` right after a failed call
    pub fn last() -> Self {
        Self::from_code(unsafe { GetLastError() })
    }

    /// Builds an error from a raw Win32 code
    pub fn from_code(raw: u32) -> Self {
        let message = HRESULT::from_win32(raw)
            .message()
            .to_string()
            .trim_end()
            .to_string();
        WinError {
            code: ErrorCode::from(raw),
            message,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl fmt::Display for WinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "Win32 error {}", self.code.raw())
        } else {
            write!(f, "{} (Win32 error {})", self.message, self.code.raw())
        }
    }
}
