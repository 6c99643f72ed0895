use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::errors::AppError;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Called with arguments that already passed schema validation. Handlers
    /// must not retain state between invocations.
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Checks the raw params object against this descriptor: required fields
    /// present, primitive types matching. The handler only ever sees
    /// arguments that passed this gate.
    pub fn validate_args(&self, params: Option<Value>) -> Result<Map<String, Value>, AppError> {
        let args = match params {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(AppError::bad_request(
                    "invalid_params",
                    "params must be an object",
                ))
            }
        };

        for param in &self.params {
            match args.get(param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(AppError::bad_request(
                            "missing_param",
                            format!("{} is required", param.name),
                        ));
                    }
                }
                Some(value) => {
                    if !param.kind.matches(value) {
                        return Err(AppError::bad_request(
                            "invalid_param_type",
                            format!("{} must be a {}", param.name, param.kind.json_type()),
                        ));
                    }
                }
            }
        }

        Ok(args)
    }

    pub fn schema_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(
                param.name.to_string(),
                json!({ "type": param.kind.json_type() }),
            );
            if param.required {
                required.push(param.name);
            }
        }

        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": {
                "type": "object",
                "properties": properties,
                "required": required
            }
        })
    }
}

/// Static table of tool descriptors. Built once at startup and shared
/// read-only by every dispatcher.
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn builtin(http: reqwest::Client, summary_api_token: Option<String>) -> Self {
        Self::new(vec![
            super::hello::descriptor(),
            super::random::descriptor(),
            super::weather::descriptor(http.clone()),
            super::summarize::descriptor(http, summary_api_token),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn list_payload(&self) -> Value {
        json!({
            "tools": self
                .tools
                .iter()
                .map(ToolDescriptor::schema_json)
                .collect::<Vec<_>>()
        })
    }
}

pub(crate) fn require_str<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, AppError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::bad_request("missing_param", format!("{name} is required")))
}
