//! Deployment step pipeline

pub mod fsm;
pub mod pipeline;

pub use fsm::{DeployEvent, DeployFsm, DeployStep};
pub use pipeline::Pipeline;
