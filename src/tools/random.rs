use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::errors::AppError;

use super::registry::{ParamKind, ParamSpec, ToolDescriptor, ToolHandler};

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "randomNumber",
        description: "Return a pseudo-random integer in [0, max)",
        params: vec![ParamSpec {
            name: "max",
            kind: ParamKind::Integer,
            required: true,
        }],
        handler: Arc::new(RandomNumberTool),
    }
}

struct RandomNumberTool;

#[async_trait]
impl ToolHandler for RandomNumberTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value, AppError> {
        let max = args
            .get("max")
            .and_then(Value::as_u64)
            .filter(|max| *max >= 1)
            .ok_or_else(|| {
                AppError::bad_request("invalid_max", "max must be a positive integer")
            })?;

        let value = rand::thread_rng().gen_range(0..max);
        Ok(json!(value))
    }
}
