//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::OrchestratorClient;
use crate::errors::BridgeError;
use crate::handlers::{health_handler, run_bot_handler, ServerState};
use crate::settings::Settings;

/// Build the bridge router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/bots/run", post(run_bot_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // the caller is a browser page, typically served from elsewhere
        .layer(CorsLayer::permissive())
}

/// Start the public surface
pub async fn serve(
    settings: &Settings,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), BridgeError>>, BridgeError> {
    let client = OrchestratorClient::new(&settings.orchestrator_url)?;
    let state = Arc::new(ServerState { client });
    let app = router(state);

    let addr = settings.bind_addr();
    info!("Starting bridge on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| BridgeError::Server(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| BridgeError::Server(e.to_string()))
    });

    Ok(handle)
}
