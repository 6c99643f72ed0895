use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AppError;

use super::registry::{require_str, ParamKind, ParamSpec, ToolDescriptor, ToolHandler};

const DEFAULT_BASE_URL: &str = "https://wttr.in";

pub fn descriptor(http: reqwest::Client) -> ToolDescriptor {
    ToolDescriptor {
        name: "weather",
        description: "Look up a one-line weather report for a city",
        params: vec![ParamSpec {
            name: "city",
            kind: ParamKind::String,
            required: true,
        }],
        handler: Arc::new(WeatherTool::new(http)),
    }
}

struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value, AppError> {
        let city = require_str(args, "city")?;

        let response = self
            .http
            .get(format!("{}/{city}", self.base_url))
            .query(&[("format", "3")])
            .send()
            .await
            .map_err(|err| {
                AppError::tool_failed("weather_unavailable", format!("weather lookup failed: {err}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::tool_failed(
                "weather_upstream_error",
                format!("weather service answered {}", response.status()),
            ));
        }

        let report = response.text().await.map_err(|err| {
            AppError::tool_failed("weather_unavailable", format!("weather lookup failed: {err}"))
        })?;

        Ok(Value::String(report.trim().to_string()))
    }
}
