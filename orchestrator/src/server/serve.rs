//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::OrchestratorError;
use crate::server::handlers::{execute_deploy_handler, health_handler};
use crate::server::state::ServerState;
use crate::settings::Settings;

/// Build the orchestrator router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/deploy/execute", post(execute_deploy_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the streaming endpoint
pub async fn serve(
    settings: &Settings,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), OrchestratorError>>, OrchestratorError> {
    let state = Arc::new(ServerState::new(settings.clone()));
    let app = router(state);

    let addr = settings.bind_addr();
    info!("Starting deploy endpoint on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| OrchestratorError::Server(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| OrchestratorError::Server(e.to_string()))
    });

    Ok(handle)
}
