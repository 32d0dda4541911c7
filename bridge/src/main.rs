//! Botdock Bridge - Entry Point
//!
//! Accepts browser deploy requests and relays the orchestrator's record
//! stream as Server-Sent Events.

use bridge::errors::BridgeError;
use bridge::serve::serve;
use bridge::settings::Settings;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting botdock bridge with settings: {:?}", settings);

    if let Err(e) = run(settings).await {
        error!("Failed to run the bridge: {e}");
    }
}

async fn run(settings: Settings) -> Result<(), BridgeError> {
    let handle = serve(&settings, await_shutdown_signal()).await?;
    handle.await.map_err(|e| BridgeError::Server(e.to_string()))?
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
