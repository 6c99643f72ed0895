//! Axum HTTP handlers for the web server
//!
//! Provides the protocol endpoint in its unary, streaming, and termination
//! forms, plus the liveness endpoint. Each inbound exchange is classified
//! by verb, path, and session header before any session state is touched.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde_json::Value;
use tokio_stream::StreamExt;
use tracing::info;

use crate::mcp::rpc::{
    json_rpc_error, parse_envelope, INVALID_REQUEST, SESSION_NOT_FOUND, STREAM_CONFLICT,
};
use crate::session::{SessionMode, StreamTakeError};
use crate::AppState;

pub const SESSION_HEADER: &str = "mcp-session-id";

pub async fn health() -> &'static str {
    "OK"
}

/// Unary protocol surface: the initialize handshake and continuation calls.
pub async fn protocol_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Reject malformed bodies before any session lookup or mutation.
    let envelope = match parse_envelope(&body) {
        Ok(envelope) => envelope,
        Err(error) => return (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    };

    if state.lifecycle.mode() == SessionMode::Stateless {
        let response = state.lifecycle.dispatcher().dispatch(envelope).await;
        return (StatusCode::OK, Json(response)).into_response();
    }

    match session_header(&headers) {
        Some(id) => match state.lifecycle.resolve(id).await {
            Some(record) => {
                let response = record.dispatch(envelope).await;
                (StatusCode::OK, Json(response)).into_response()
            }
            None => rpc_error_response(
                StatusCode::NOT_FOUND,
                envelope.id,
                SESSION_NOT_FOUND,
                "No valid session",
            ),
        },
        None if envelope.is_initialize() => {
            let record = state.lifecycle.create_session().await;
            info!(session = %record.id(), "session initialized");

            let response = record.dispatch(envelope).await;
            record.activate();

            let mut http_response = (StatusCode::OK, Json(response)).into_response();
            if let Ok(value) = HeaderValue::from_str(record.id()) {
                http_response
                    .headers_mut()
                    .insert(HeaderName::from_static(SESSION_HEADER), value);
            }
            http_response
        }
        None => rpc_error_response(
            StatusCode::BAD_REQUEST,
            envelope.id,
            SESSION_NOT_FOUND,
            "No valid session",
        ),
    }
}

/// Long-lived server-push channel for one session. Never receiving data is
/// not an error; the stream ends when the session closes or the peer goes
/// away.
pub async fn protocol_stream(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.lifecycle.mode() == SessionMode::Stateless {
        return rpc_error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            None,
            INVALID_REQUEST,
            "Method not allowed",
        );
    }

    let Some(id) = session_header(&headers) else {
        return rpc_error_response(
            StatusCode::BAD_REQUEST,
            None,
            SESSION_NOT_FOUND,
            "No valid session",
        );
    };
    let Some(record) = state.lifecycle.resolve(id).await else {
        return rpc_error_response(
            StatusCode::NOT_FOUND,
            None,
            SESSION_NOT_FOUND,
            "No valid session",
        );
    };

    match record.take_stream().await {
        Ok(lease) => {
            let stream =
                lease.map(|message| Ok::<_, Infallible>(Event::default().data(message.to_string())));
            Sse::new(stream)
                .keep_alive(KeepAlive::default())
                .into_response()
        }
        Err(StreamTakeError::AlreadyOpen) => rpc_error_response(
            StatusCode::CONFLICT,
            None,
            STREAM_CONFLICT,
            "Stream already open for this session",
        ),
        Err(StreamTakeError::Closed) => rpc_error_response(
            StatusCode::NOT_FOUND,
            None,
            SESSION_NOT_FOUND,
            "No valid session",
        ),
    }
}

/// Explicit session termination. Repeating the call for an identifier that
/// is already gone is a clean no-op.
pub async fn protocol_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.lifecycle.mode() == SessionMode::Stateless {
        return rpc_error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            None,
            INVALID_REQUEST,
            "Method not allowed",
        );
    }

    let Some(id) = session_header(&headers) else {
        return rpc_error_response(
            StatusCode::BAD_REQUEST,
            None,
            SESSION_NOT_FOUND,
            "No valid session",
        );
    };

    state.lifecycle.terminate(id).await;
    StatusCode::NO_CONTENT.into_response()
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn rpc_error_response(
    status: StatusCode,
    id: Option<Value>,
    code: i32,
    message: &str,
) -> Response {
    (status, Json(json_rpc_error(id, code, message))).into_response()
}
