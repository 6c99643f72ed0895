use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AppError;

use super::registry::{require_str, ParamKind, ParamSpec, ToolDescriptor, ToolHandler};

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "hello",
        description: "Format a greeting for the given name",
        params: vec![ParamSpec {
            name: "name",
            kind: ParamKind::String,
            required: true,
        }],
        handler: Arc::new(HelloTool),
    }
}

struct HelloTool;

#[async_trait]
impl ToolHandler for HelloTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value, AppError> {
        let name = require_str(args, "name")?;
        Ok(Value::String(format!("Hello, {name}! 👋")))
    }
}
