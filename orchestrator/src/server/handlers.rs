//! HTTP request handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use botdock_wire::{ndjson, DeployRequest};

use crate::deploy::Pipeline;
use crate::errors::OrchestratorError;
use crate::relay;
use crate::server::state::ServerState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "botdock-orchestrator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Execute one deployment, streaming its records as NDJSON.
///
/// The response body carries one JSON record per line and ends exactly when
/// the relay closes, i.e. after the terminal record. If the caller
/// disconnects mid-stream the body is dropped and forwarding stops; the
/// pipeline (and its subprocess) runs to completion regardless.
pub async fn execute_deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeployRequest>,
) -> Response {
    let deployment_id = Uuid::new_v4();

    let pipeline = match Pipeline::new(&state.settings, request.clone()) {
        Ok(pipeline) => pipeline,
        Err(e @ OrchestratorError::Validation(_)) => {
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
        Err(e) => {
            error!(%deployment_id, "failed to set up pipeline: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    info!(
        %deployment_id,
        bot_id = %request.bot_id,
        version = %request.version,
        "accepted deploy request"
    );

    let (sink, stream) = relay::channel();
    tokio::spawn(async move {
        // Dropping the sink at the end of this task closes the relay, so
        // the terminal record pushed by run() is always observed last.
        if let Err(e) = pipeline.run(&sink).await {
            error!(%deployment_id, "deployment failed: {}", e);
        }
    });

    let body = Body::from_stream(stream.map(|record| ndjson::encode(&record)));

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(body)
    {
        Ok(response) => response,
        Err(e) => {
            error!(%deployment_id, "failed to build stream response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
