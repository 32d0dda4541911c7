//! Streaming deploy endpoint

pub mod handlers;
pub mod serve;
pub mod state;
