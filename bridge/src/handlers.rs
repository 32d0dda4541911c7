//! HTTP request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use botdock_wire::{DeployRequest, LogResponse, LogStatus};

use crate::client::OrchestratorClient;
use crate::errors::BridgeError;

/// Shared state for the bridge
pub struct ServerState {
    /// Client for the orchestrator's streaming endpoint
    pub client: OrchestratorClient,
}

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
        service: "botdock-bridge".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run one bot deployment, relaying its log stream as Server-Sent Events.
///
/// Each upstream record becomes one `log` event, flushed as it arrives.
/// The stream always closes with a distinguished `done` or `error` event:
/// once streaming has begun the HTTP status is committed, so completion
/// versus failure is communicated through the events alone.
pub async fn run_bot_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DeployRequest>,
) -> Response {
    if let Err(e) = validate_request(&request) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    info!(
        bot_id = %request.bot_id,
        version = %request.version,
        "forwarding deploy request"
    );

    let upstream = match state.client.execute_deploy(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("failed to start deployment: {}", e);
            return (StatusCode::BAD_GATEWAY, e.to_string()).into_response();
        }
    };

    Sse::new(relay_events(Box::pin(upstream)))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn validate_request(request: &DeployRequest) -> Result<(), BridgeError> {
    if request.bot_id.trim().is_empty() {
        return Err(BridgeError::Validation("bot_id is empty".to_string()));
    }
    if request.version.trim().is_empty() {
        return Err(BridgeError::Validation("version is empty".to_string()));
    }
    Url::parse(&request.git_repo)
        .map_err(|e| BridgeError::Validation(format!("invalid git_repo: {}", e)))?;
    Ok(())
}

enum RelayPhase<S> {
    Streaming { upstream: S, last: Option<LogStatus> },
    Closed,
}

/// Turn the upstream record stream into SSE events plus one closing event
fn relay_events<S>(upstream: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = Result<LogResponse, BridgeError>> + Unpin,
{
    futures::stream::unfold(
        RelayPhase::Streaming {
            upstream,
            last: None,
        },
        |phase| async move {
            match phase {
                RelayPhase::Streaming { mut upstream, last } => match upstream.next().await {
                    Some(Ok(record)) => {
                        let status = record.status;
                        Some((
                            Ok(log_event(&record)),
                            RelayPhase::Streaming {
                                upstream,
                                last: Some(status),
                            },
                        ))
                    }
                    Some(Err(e)) => {
                        error!("stream transport failure: {}", e);
                        let event = Event::default()
                            .event("error")
                            .data(format!("stream transport failure: {}", e));
                        Some((Ok(event), RelayPhase::Closed))
                    }
                    None => {
                        let (name, data) = closing_fragment(last);
                        Some((
                            Ok(Event::default().event(name).data(data)),
                            RelayPhase::Closed,
                        ))
                    }
                },
                RelayPhase::Closed => None,
            }
        },
    )
}

fn log_event(record: &LogResponse) -> Event {
    let data = serde_json::to_string(record).unwrap_or_else(|_| record.line.clone());
    Event::default().event("log").data(data)
}

/// Distinguished closing fragment, chosen by the terminal record's status
fn closing_fragment(last: Option<LogStatus>) -> (&'static str, &'static str) {
    match last {
        Some(LogStatus::Success) => ("done", "deployment finished"),
        _ => ("error", "deployment failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(bot_id: &str, git_repo: &str, version: &str) -> DeployRequest {
        DeployRequest {
            bot_id: bot_id.to_string(),
            git_repo: git_repo.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request(&request("alpha", "https://example/a.git", "v1")).is_ok());
        assert!(validate_request(&request("", "https://example/a.git", "v1")).is_err());
        assert!(validate_request(&request("alpha", "https://example/a.git", " ")).is_err());
        assert!(validate_request(&request("alpha", "not a url", "v1")).is_err());
    }

    #[test]
    fn test_closing_fragment_follows_terminal_status() {
        assert_eq!(
            closing_fragment(Some(LogStatus::Success)),
            ("done", "deployment finished")
        );
        assert_eq!(
            closing_fragment(Some(LogStatus::Error)),
            ("error", "deployment failed")
        );
        // a stream that ended without any terminal record is a failure too
        assert_eq!(closing_fragment(None).0, "error");
        assert_eq!(closing_fragment(Some(LogStatus::Info)).0, "error");
    }

    #[tokio::test]
    async fn test_relay_emits_one_closing_event() {
        let upstream = futures::stream::iter(vec![
            Ok(LogResponse::info("cloning")),
            Ok(LogResponse::success("Bot finished successfully.")),
        ]);

        let events: Vec<_> = relay_events(Box::pin(upstream)).collect().await;
        // two log events plus the closing fragment
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_relay_stops_at_transport_failure() {
        let upstream = futures::stream::iter(vec![
            Ok(LogResponse::info("cloning")),
            Err(BridgeError::Transport("connection reset".to_string())),
            Ok(LogResponse::info("never seen")),
        ]);

        let events: Vec<_> = relay_events(Box::pin(upstream)).collect().await;
        // one log event, then the error fragment ends the stream
        assert_eq!(events.len(), 2);
    }
}
