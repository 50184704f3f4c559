//! Newline-delimited JSON front-end for [`MemoryOperations`]
//!
//! Each input line is one request object, each output line one response:
//!
//! ```text
//! {"id":1,"op":"readMemoryAsArray","pid":4242,"address":"0x7FF6A000","size":8}
//! {"id":1,"ok":true,"result":{"byteArray":[...],"valueInfo":{...}}}
//! ```
//!
//! Arguments are validated here before the engine is called; malformed
//! requests are answered with the `InvalidRequest` error kind.

pub mod request;
pub mod response;

pub use request::{ByteInput, Request};
pub use response::{ArrayPayload, ErrorBody, ReadPayload, Response, ValueInfo};

use crate::core::types::MemoryError;
use crate::memory::MemoryOperations;
use crate::process::Platform;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Error kind reported for requests that never reach the engine
pub const INVALID_REQUEST: &str = "InvalidRequest";

/// Failure of a single request
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("Failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

impl BindingError {
    pub fn kind(&self) -> &'static str {
        match self {
            BindingError::InvalidRequest(_) => INVALID_REQUEST,
            BindingError::Memory(e) => e.kind(),
            BindingError::Encode(_) => "EncodeFailed",
        }
    }
}

/// Parses one request line, runs it and builds the reply. The `id` is
/// echoed whenever the line was a JSON object carrying one, even if the
/// rest of the request is invalid.
pub fn handle_line<P: Platform>(ops: &MemoryOperations<P>, line: &str) -> Response {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "unparseable request line");
            return Response::failure(None, INVALID_REQUEST, e.to_string());
        }
    };
    let id = value.get("id").and_then(Value::as_u64);

    let outcome = Request::deserialize(&value)
        .map_err(|e| BindingError::InvalidRequest(e.to_string()))
        .and_then(|request| {
            debug!(?id, op = request.op(), "dispatching request");
            dispatch(ops, request)
        });

    match outcome {
        Ok(result) => Response::success(id, result),
        Err(e) => {
            warn!(?id, kind = e.kind(), error = %e, "request failed");
            Response::failure(id, e.kind(), e.to_string())
        }
    }
}

/// Runs a parsed request against the engine
pub fn dispatch<P: Platform>(ops: &MemoryOperations<P>, request: Request) -> Result<Value, BindingError> {
    match request {
        Request::ListProcesses => encode(ops.list_processes()?),
        Request::ReadMemory { pid, address, size } => {
            let bytes = ops.read_memory(pid, address, size)?;
            encode(ReadPayload::new(address, &bytes))
        }
        Request::ReadMemoryAsArray { pid, address, size } => {
            let bytes = ops.read_memory_as_array(pid, address, size)?;
            let payload = ArrayPayload::new(address, bytes);
            debug!(pid, %address, bytes = %payload.dump(), "read memory as array");
            encode(payload)
        }
        Request::WriteMemory {
            pid,
            address,
            bytes,
        } => {
            let bytes = bytes
                .into_bytes()
                .map_err(|e| BindingError::InvalidRequest(format!("bytes: {}", e)))?;
            ops.write_memory(pid, address, &bytes)?;
            Ok(Value::Bool(true))
        }
        Request::ScanMemoryForValue { pid, value } => encode(ops.scan_memory_for_value(pid, value)?),
        Request::ScanMemory { pid, value } => encode(ops.scan_and_verify(pid, value)?),
    }
}

fn encode<T: Serialize>(value: T) -> Result<Value, BindingError> {
    serde_json::to_value(value).map_err(BindingError::Encode)
}
