use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::errors::AppError;

use super::registry::{require_str, ParamKind, ParamSpec, ToolDescriptor, ToolHandler};

const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";

pub fn descriptor(http: reqwest::Client, api_token: Option<String>) -> ToolDescriptor {
    ToolDescriptor {
        name: "summarize",
        description: "Summarize a text via the hosted inference API",
        params: vec![ParamSpec {
            name: "text",
            kind: ParamKind::String,
            required: true,
        }],
        handler: Arc::new(SummarizeTool::new(http, api_token)),
    }
}

struct SummarizeTool {
    http: reqwest::Client,
    api_token: Option<String>,
    endpoint: String,
}

impl SummarizeTool {
    fn new(http: reqwest::Client, api_token: Option<String>) -> Self {
        Self {
            http,
            api_token,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl ToolHandler for SummarizeTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value, AppError> {
        let text = require_str(args, "text")?;
        let token = self.api_token.as_deref().ok_or_else(|| {
            AppError::tool_failed("missing_credential", "SUMMARY_API_TOKEN is not configured")
        })?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&json!({ "inputs": text }))
            .send()
            .await
            .map_err(|err| {
                AppError::tool_failed(
                    "summary_unavailable",
                    format!("summarization request failed: {err}"),
                )
            })?;

        if !response.status().is_success() {
            return Err(AppError::tool_failed(
                "summary_upstream_error",
                format!("summarization service answered {}", response.status()),
            ));
        }

        let payload: Value = response.json().await.map_err(|err| {
            AppError::tool_failed(
                "summary_unavailable",
                format!("summarization response unreadable: {err}"),
            )
        })?;

        // The inference API answers [{"summary_text": "..."}].
        let summary = payload
            .get(0)
            .and_then(|item| item.get("summary_text"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::tool_failed(
                    "summary_malformed_response",
                    "summarization response had no summary_text",
                )
            })?;

        Ok(Value::String(summary.to_string()))
    }
}
