//! Botdock Orchestrator - Entry Point
//!
//! Accepts deploy requests over a long-lived streaming call, runs the
//! fetch/provision/execute pipeline, and streams every log record back.

use orchestrator::errors::OrchestratorError;
use orchestrator::logs::{init_logging, LogOptions};
use orchestrator::server::serve::serve;
use orchestrator::settings::Settings;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    info!("Starting botdock orchestrator with settings: {:?}", settings);

    if let Err(e) = run(settings).await {
        error!("Failed to run the orchestrator: {e}");
    }
}

async fn run(settings: Settings) -> Result<(), OrchestratorError> {
    let handle = serve(&settings, await_shutdown_signal()).await?;
    handle
        .await
        .map_err(|e| OrchestratorError::Server(e.to_string()))?
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
