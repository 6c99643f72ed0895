use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod session;
pub mod tools;

use config::Config;
use session::LifecycleController;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<LifecycleController>,
}

impl AppState {
    pub fn new(lifecycle: Arc<LifecycleController>) -> Self {
        Self { lifecycle }
    }
}

pub fn build_app(state: AppState, config: &Config) -> Router {
    let session_header = HeaderName::from_static(http::handlers::SESSION_HEADER);
    let allow_origin = match &config.allowed_origin {
        Some(origin) => AllowOrigin::exact(origin.clone()),
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, session_header.clone()])
        .expose_headers([session_header]);

    Router::new()
        .route("/", get(http::handlers::health))
        .route(
            &config.mcp_path,
            post(http::handlers::protocol_post)
                .get(http::handlers::protocol_stream)
                .delete(http::handlers::protocol_delete),
        )
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
