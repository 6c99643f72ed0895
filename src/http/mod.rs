//! HTTP transport layer for the Model Context Protocol
//!
//! Provides the external routing surface: the protocol endpoint and the liveness probe.

pub mod handlers;
