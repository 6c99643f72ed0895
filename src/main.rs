use std::sync::Arc;
use std::time::Duration;

use toolbox_mcp::{
    build_app,
    config::Config,
    logging,
    session::{InMemorySessionStore, LifecycleController, SessionMode},
    tools::ToolRegistry,
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let tools = Arc::new(ToolRegistry::builtin(
        http_client,
        config.summary_api_token.clone(),
    ));

    let mode = if config.stateless {
        SessionMode::Stateless
    } else {
        SessionMode::Stateful
    };
    let store = Arc::new(InMemorySessionStore::default());
    let lifecycle = Arc::new(LifecycleController::new(mode, store, tools));

    let state = AppState::new(lifecycle.clone());
    let app = build_app(state, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_socket()?).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        mcp_path = %config.mcp_path,
        mode = ?mode,
        "server starting"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    lifecycle.shutdown().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
