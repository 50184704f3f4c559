//! Outgoing responses of the line protocol

use crate::core::types::{raw_dump, Address, ValueInterpretation};
use serde::Serialize;
use serde_json::Value;

/// Reply to one request line. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error payload: `kind` is the stable taxonomy name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl Response {
    pub fn success(id: Option<u64>, result: Value) -> Self {
        Response {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<u64>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Response {
            id,
            ok: false,
            result: None,
            error: Some(ErrorBody {
                kind: kind.into(),
                message: message.into(),
            }),
        }
    }

    /// Error kind, when this is a failure
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind.as_str())
    }
}

/// Result of `readMemory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadPayload {
    pub address: Address,
    pub length: usize,
    /// Transferred bytes as contiguous lowercase hex
    pub bytes: String,
}

impl ReadPayload {
    pub fn new(address: Address, bytes: &[u8]) -> Self {
        ReadPayload {
            address,
            length: bytes.len(),
            bytes: hex::encode(bytes),
        }
    }
}

/// Result of `readMemoryAsArray`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayPayload {
    pub byte_array: Vec<u8>,
    /// Present once at least four bytes were transferred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_info: Option<ValueInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueInfo {
    pub address: String,
    #[serde(flatten)]
    pub values: ValueInterpretation,
}

impl ArrayPayload {
    pub fn new(address: Address, bytes: Vec<u8>) -> Self {
        let value_info = (bytes.len() >= 4).then(|| ValueInfo {
            address: address.to_string(),
            values: ValueInterpretation::from_bytes(&bytes),
        });
        ArrayPayload {
            byte_array: bytes,
            value_info,
        }
    }

    /// Same spacing as the `rawBytes` field, for log lines
    pub fn dump(&self) -> String {
        raw_dump(&self.byte_array)
    }
}
