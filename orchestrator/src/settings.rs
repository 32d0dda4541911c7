//! Orchestrator settings

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Orchestrator settings
///
/// Every field can be overridden through a `BOTDOCK_*` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bind host for the streaming endpoint
    pub host: String,

    /// Bind port for the streaming endpoint
    pub port: u16,

    /// Root directory holding one workspace per (bot_id, version)
    pub bots_dir: PathBuf,

    /// Git executable used by the fetch step
    pub git_bin: String,

    /// Python executable used to provision environments and as the
    /// fallback interpreter when no environment exists
    pub python_bin: String,

    /// Deadline for the fetch step, in seconds
    pub fetch_timeout_secs: u64,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
            bots_dir: PathBuf::from("bots"),
            git_bin: "git".to_string(),
            python_bin: "python3".to_string(),
            fetch_timeout_secs: 600,
            log_level: LogLevel::Info,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(host) = std::env::var("BOTDOCK_HOST") {
            settings.host = host;
        }
        if let Some(port) = env_parsed("BOTDOCK_PORT") {
            settings.port = port;
        }
        if let Ok(dir) = std::env::var("BOTDOCK_BOTS_DIR") {
            settings.bots_dir = PathBuf::from(dir);
        }
        if let Ok(bin) = std::env::var("BOTDOCK_GIT_BIN") {
            settings.git_bin = bin;
        }
        if let Ok(bin) = std::env::var("BOTDOCK_PYTHON_BIN") {
            settings.python_bin = bin;
        }
        if let Some(secs) = env_parsed("BOTDOCK_FETCH_TIMEOUT_SECS") {
            settings.fetch_timeout_secs = secs;
        }
        if let Some(level) = env_parsed("BOTDOCK_LOG_LEVEL") {
            settings.log_level = level;
        }

        settings
    }

    /// Deadline applied to the fetch step
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Bind address string
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr(), "0.0.0.0:50051");
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(600));
        assert_eq!(settings.bots_dir, PathBuf::from("bots"));
    }
}
