use std::{env, net::SocketAddr};

use axum::http::HeaderValue;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub mcp_path: String,
    pub stateless: bool,
    /// `None` means any origin is allowed.
    pub allowed_origin: Option<HeaderValue>,
    pub summary_api_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MCP_PATH must start with '/'")]
    InvalidMcpPath,
    #[error("MCP_STATELESS must be one of: true, false, 1, 0")]
    InvalidStatelessFlag,
    #[error("MCP_ALLOWED_ORIGIN must be a valid header value")]
    InvalidAllowedOrigin,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let mcp_path = env::var("MCP_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "/mcp".to_string());
        if !mcp_path.starts_with('/') {
            return Err(ConfigError::InvalidMcpPath);
        }

        let stateless = match env::var("MCP_STATELESS")
            .ok()
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .as_deref()
        {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(_) => return Err(ConfigError::InvalidStatelessFlag),
        };

        let allowed_origin = env::var("MCP_ALLOWED_ORIGIN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty() && value != "*")
            .map(|value| {
                value
                    .parse::<HeaderValue>()
                    .map_err(|_| ConfigError::InvalidAllowedOrigin)
            })
            .transpose()?;

        let summary_api_token = env::var("SUMMARY_API_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let config = Self {
            bind_addr,
            bind_port,
            mcp_path,
            stateless,
            allowed_origin,
            summary_api_token,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
