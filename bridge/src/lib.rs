//! Botdock Bridge Library
//!
//! Public HTTP surface for deployments: accepts a browser request, issues
//! the internal streaming deploy call, and re-emits every log record as an
//! incrementally flushed event-stream fragment.

pub mod client;
pub mod errors;
pub mod handlers;
pub mod serve;
pub mod settings;
