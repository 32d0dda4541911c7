//! Server state

use crate::settings::Settings;

/// Shared state for the streaming endpoint
#[derive(Debug)]
pub struct ServerState {
    /// Orchestrator settings, used to build one pipeline per request
    pub settings: Settings,
}

impl ServerState {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}
