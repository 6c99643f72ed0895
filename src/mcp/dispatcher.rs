//! Call dispatch against the tool registry
//!
//! Provides envelope-level method routing, parameter validation, and
//! normalization of handler results and failures into response envelopes.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result, RequestEnvelope,
    METHOD_NOT_FOUND,
};
use crate::tools::ToolRegistry;

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2025-03-26";

/// Executes validated calls against one tool registry. A handler failure is
/// local to its call: the dispatcher holds no mutable state, so other
/// in-flight calls on the same session are unaffected.
#[derive(Clone)]
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    pub async fn dispatch(&self, envelope: RequestEnvelope) -> Value {
        let RequestEnvelope {
            id, method, params, ..
        } = envelope;

        let response = match method.as_str() {
            "initialize" => initialize_result(id),
            "ping" => json_rpc_result(id, json!({})),
            "tools/list" => json_rpc_result(id, self.tools.list_payload()),
            name => self.call_tool(id, name, params).await,
        };

        info!(
            method = %method,
            outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
            "rpc call handled"
        );

        response
    }

    async fn call_tool(&self, id: Option<Value>, name: &str, params: Option<Value>) -> Value {
        let Some(descriptor) = self.tools.get(name) else {
            return json_rpc_error(id, METHOD_NOT_FOUND, "Method not found");
        };

        let args = match descriptor.validate_args(params) {
            Ok(args) => args,
            Err(err) => return app_error_to_json_rpc(id, err),
        };

        match descriptor.handler.invoke(&args).await {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => {
                warn!(tool = name, error = %err, "tool invocation failed");
                app_error_to_json_rpc(id, err)
            }
        }
    }
}

fn initialize_result(id: Option<Value>) -> Value {
    json_rpc_result(
        id,
        json!({
            "protocolVersion": SUPPORTED_PROTOCOL_VERSION,
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": { "listChanged": false }
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Map;

    use crate::errors::AppError;
    use crate::mcp::rpc::{INVALID_PARAMS, TOOL_EXECUTION_ERROR};
    use crate::tools::{ParamKind, ParamSpec, ToolDescriptor, ToolHandler};

    use super::*;

    struct FailingTool;

    #[async_trait]
    impl ToolHandler for FailingTool {
        async fn invoke(&self, _args: &Map<String, Value>) -> Result<Value, AppError> {
            Err(AppError::tool_failed("downstream_down", "backend offline"))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        async fn invoke(&self, args: &Map<String, Value>) -> Result<Value, AppError> {
            Ok(args.get("word").cloned().unwrap_or(Value::Null))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(ToolRegistry::new(vec![
            ToolDescriptor {
                name: "echo",
                description: "echo a word back",
                params: vec![ParamSpec {
                    name: "word",
                    kind: ParamKind::String,
                    required: true,
                }],
                handler: Arc::new(EchoTool),
            },
            ToolDescriptor {
                name: "broken",
                description: "always fails",
                params: vec![],
                handler: Arc::new(FailingTool),
            },
        ])))
    }

    fn envelope(raw: Value) -> RequestEnvelope {
        serde_json::from_value(raw).expect("test envelope should parse")
    }

    #[tokio::test]
    async fn unknown_method_is_tool_not_found() {
        let response = dispatcher()
            .dispatch(envelope(json!({ "jsonrpc": "2.0", "id": 1, "method": "nope" })))
            .await;
        assert_eq!(response["error"]["code"], json!(METHOD_NOT_FOUND));
        assert_eq!(response["id"], json!(1));
    }

    #[tokio::test]
    async fn validation_failure_names_the_field() {
        let response = dispatcher()
            .dispatch(envelope(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "echo",
                "params": { "word": 7 }
            })))
            .await;
        assert_eq!(response["error"]["code"], json!(INVALID_PARAMS));
        assert!(response["error"]["data"]["message"]
            .as_str()
            .expect("data message")
            .contains("word"));
    }

    #[tokio::test]
    async fn handler_result_is_wrapped_in_result_envelope() {
        let response = dispatcher()
            .dispatch(envelope(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "echo",
                "params": { "word": "ping" }
            })))
            .await;
        assert_eq!(response["result"], json!("ping"));
        assert_eq!(response["id"], json!(3));
    }

    #[tokio::test]
    async fn handler_failure_becomes_execution_error() {
        let response = dispatcher()
            .dispatch(envelope(json!({ "jsonrpc": "2.0", "id": 4, "method": "broken" })))
            .await;
        assert_eq!(response["error"]["code"], json!(TOOL_EXECUTION_ERROR));
        assert_eq!(response["error"]["data"]["code"], json!("downstream_down"));
    }

    #[tokio::test]
    async fn failure_does_not_poison_later_calls() {
        let dispatcher = dispatcher();
        let _ = dispatcher
            .dispatch(envelope(json!({ "jsonrpc": "2.0", "id": 5, "method": "broken" })))
            .await;

        let response = dispatcher
            .dispatch(envelope(json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "echo",
                "params": { "word": "still-alive" }
            })))
            .await;
        assert_eq!(response["result"], json!("still-alive"));
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let response = dispatcher()
            .dispatch(envelope(json!({ "jsonrpc": "2.0", "id": 7, "method": "initialize" })))
            .await;
        assert_eq!(
            response["result"]["protocolVersion"],
            json!(SUPPORTED_PROTOCOL_VERSION)
        );
        assert_eq!(
            response["result"]["serverInfo"]["name"],
            json!(env!("CARGO_PKG_NAME"))
        );
    }

    #[tokio::test]
    async fn tools_list_enumerates_descriptors() {
        let response = dispatcher()
            .dispatch(envelope(json!({ "jsonrpc": "2.0", "id": 8, "method": "tools/list" })))
            .await;
        let tools = response["result"]["tools"]
            .as_array()
            .expect("tools array");
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], json!("echo"));
    }

    #[tokio::test]
    async fn missing_id_is_echoed_as_null() {
        let response = dispatcher()
            .dispatch(envelope(json!({ "jsonrpc": "2.0", "method": "ping" })))
            .await;
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["result"], json!({}));
    }
}
