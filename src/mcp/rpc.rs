//! JSON-RPC protocol representations and formatting utilities
//!
//! Provides the wire envelope types plus standardized mapping of internal
//! AppErrors to valid JSON-RPC payloads.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const TOOL_EXECUTION_ERROR: i32 = -32000;
pub const SESSION_NOT_FOUND: i32 = -32001;
pub const STREAM_CONFLICT: i32 = -32002;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn default_jsonrpc_version() -> String {
    "2.0".to_string()
}

impl RequestEnvelope {
    pub fn is_initialize(&self) -> bool {
        self.method == "initialize"
    }
}

/// Decodes a request body into an envelope, or the error payload to answer
/// with. Runs before any session lookup so malformed bodies never touch
/// session state.
pub fn parse_envelope(body: &[u8]) -> Result<RequestEnvelope, Value> {
    let envelope: RequestEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(_) => return Err(json_rpc_error(None, PARSE_ERROR, "Parse error")),
    };

    if envelope.jsonrpc != "2.0" || envelope.method.trim().is_empty() {
        return Err(json_rpc_error(envelope.id, INVALID_REQUEST, "Invalid Request"));
    }

    Ok(envelope)
}

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            json!({ "code": code, "message": message }),
        ),
        AppError::ToolExecution { code, message } => json_rpc_error_with_data(
            id,
            TOOL_EXECUTION_ERROR,
            "Tool execution failed",
            json!({ "code": code, "message": message }),
        ),
        AppError::Internal { .. } => json_rpc_error(id, INTERNAL_ERROR, "Internal error"),
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub fn json_rpc_error_with_data(id: Option<Value>, code: i32, message: &str, data: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
            "data": data
        }
    })
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}
