//! Incoming requests of the line protocol

use crate::core::types::{Address, ProcessId};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// One operation, selected by the `op` field of a request object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    ListProcesses,
    ReadMemory {
        pid: ProcessId,
        address: Address,
        size: usize,
    },
    ReadMemoryAsArray {
        pid: ProcessId,
        address: Address,
        size: usize,
    },
    WriteMemory {
        pid: ProcessId,
        address: Address,
        bytes: ByteInput,
    },
    ScanMemoryForValue {
        pid: ProcessId,
        #[serde(deserialize_with = "scan_value")]
        value: u32,
    },
    /// Scan followed by a re-read of every match
    ScanMemory {
        pid: ProcessId,
        #[serde(deserialize_with = "scan_value")]
        value: u32,
    },
}

impl Request {
    /// Protocol name of the operation, as sent in `op`
    pub fn op(&self) -> &'static str {
        match self {
            Request::ListProcesses => "listProcesses",
            Request::ReadMemory { .. } => "readMemory",
            Request::ReadMemoryAsArray { .. } => "readMemoryAsArray",
            Request::WriteMemory { .. } => "writeMemory",
            Request::ScanMemoryForValue { .. } => "scanMemoryForValue",
            Request::ScanMemory { .. } => "scanMemory",
        }
    }
}

/// Bytes to write: a hex string (`"deadbeef"`, `"de ad be ef"`) or an array
/// of integers 0-255
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByteInput {
    Hex(String),
    Array(Vec<u8>),
}

impl ByteInput {
    pub fn into_bytes(self) -> Result<Vec<u8>, hex::FromHexError> {
        match self {
            ByteInput::Array(bytes) => Ok(bytes),
            ByteInput::Hex(text) => {
                let digits: String = text.split_whitespace().collect();
                let digits = digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                    .unwrap_or(&digits);
                hex::decode(digits)
            }
        }
    }
}

/// Accepts any integer that fits in 32 bits. Negative values are taken as
/// their two's complement pattern, so `-1` scans for `0xFFFFFFFF`.
fn scan_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    u32::try_from(raw)
        .or_else(|_| i32::try_from(raw).map(|v| v as u32))
        .map_err(|_| D::Error::custom(format!("value {} does not fit in 32 bits", raw)))
}
