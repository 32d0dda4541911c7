//! Bridge settings

use serde::{Deserialize, Serialize};

/// Bridge settings
///
/// Every field can be overridden through a `BOTDOCK_*` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bind host for the public surface
    pub host: String,

    /// Bind port for the public surface
    pub port: u16,

    /// Base URL of the orchestrator's streaming endpoint
    pub orchestrator_url: String,

    /// Log level filter
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            orchestrator_url: "http://localhost:50051".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(host) = std::env::var("BOTDOCK_BRIDGE_HOST") {
            settings.host = host;
        }
        if let Some(port) = std::env::var("BOTDOCK_BRIDGE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            settings.port = port;
        }
        if let Ok(url) = std::env::var("BOTDOCK_ORCHESTRATOR_URL") {
            settings.orchestrator_url = url;
        }
        if let Ok(level) = std::env::var("BOTDOCK_BRIDGE_LOG_LEVEL") {
            settings.log_level = level;
        }

        settings
    }

    /// Bind address string
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
