//! Typed views over raw bytes read from a target process

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// The leading bytes of a read decoded as the common scalar types, in the
/// host's native byte order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueInterpretation {
    pub raw_bytes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_int32: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_uint32: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_uint32: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_int64: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_uint64: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex_uint64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_float: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_double: Option<f64>,
}

impl ValueInterpretation {
    /// Decodes whatever prefix of `bytes` is long enough for each type
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let word = first::<4>(bytes);
        let dword = first::<8>(bytes);

        ValueInterpretation {
            raw_bytes: raw_dump(bytes),
            as_int32: word.map(i32::from_ne_bytes),
            as_uint32: word.map(u32::from_ne_bytes),
            hex_uint32: word.map(|w| format!("0x{:X}", u32::from_ne_bytes(w))),
            as_int64: dword.map(i64::from_ne_bytes),
            as_uint64: dword.map(u64::from_ne_bytes),
            hex_uint64: dword.map(|d| format!("0x{:X}", u64::from_ne_bytes(d))),
            as_float: word.map(f32::from_ne_bytes),
            as_double: dword.map(f64::from_ne_bytes),
        }
    }
}

fn first<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.get(..N)?.try_into().ok()
}

/// Space separated lowercase hex, e.g. `"de ad be ef"`
pub fn raw_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
