//! Streaming endpoint tests
//!
//! Drive the router directly with `tower::ServiceExt::oneshot` and collect
//! the NDJSON body once the relay has closed.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use botdock_wire::{DeployRequest, LogResponse, LogStatus};
use orchestrator::server::serve::router;
use orchestrator::server::state::ServerState;
use orchestrator::settings::Settings;

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

fn test_state(tmp: &TempDir) -> Arc<ServerState> {
    let bin = tmp.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let git = write_script(
        &bin,
        "git",
        r#"for last in "$@"; do :; done
mkdir -p "$last"
echo "Cloning""#,
    );
    let python = write_script(&bin, "python", r#"echo "bot running""#);

    Arc::new(ServerState::new(Settings {
        bots_dir: tmp.path().join("bots"),
        git_bin: git,
        python_bin: python,
        ..Default::default()
    }))
}

fn deploy_request_body(bot_id: &str, version: &str) -> Body {
    let request = DeployRequest {
        bot_id: bot_id.to_string(),
        git_repo: "https://example/alpha.git".to_string(),
        version: version.to_string(),
    };
    Body::from(serde_json::to_vec(&request).unwrap())
}

#[tokio::test]
async fn test_execute_deploy_streams_ndjson_until_terminal() {
    let tmp = TempDir::new().unwrap();
    let app = router(test_state(&tmp));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/deploy/execute")
                .header(header::CONTENT_TYPE, "application/json")
                .body(deploy_request_body("alpha", "v1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-ndjson"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let records: Vec<LogResponse> = bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).unwrap())
        .collect();

    assert!(!records.is_empty());
    assert!(records.iter().any(|r| r.line == "bot running"));

    // the stream ends with exactly one terminal record
    let last = records.last().unwrap();
    assert_eq!(last.status, LogStatus::Success);
    assert_eq!(last.line, "Bot finished successfully.");
}

#[tokio::test]
async fn test_invalid_identifier_is_rejected_before_streaming() {
    let tmp = TempDir::new().unwrap();
    let app = router(test_state(&tmp));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/deploy/execute")
                .header(header::CONTENT_TYPE, "application/json")
                .body(deploy_request_body("../escape", "v1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let app = router(test_state(&tmp));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
