//! Botdock Orchestrator Library
//!
//! Deploys an external bot workload: fetches its source from a git
//! repository, provisions an isolated runtime environment, executes it, and
//! streams every log line back to the caller in real time.

pub mod deploy;
pub mod errors;
pub mod logs;
pub mod relay;
pub mod runner;
pub mod server;
pub mod settings;
pub mod workspace;
