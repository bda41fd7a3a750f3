//! Hermes Runner
//!
//! Wires the orchestrator together for paper trading:
//!
//! - **Config**: TOML file plus `HERMES_`-prefixed environment
//!   overrides, deserialized into one [`RunnerConfig`]
//! - **Bootstrap**: builds the paper venue, journal writer, alert sink,
//!   risk manager and trade engine from the config
//! - **Replay source**: a scripted stand-in for the strategy layer,
//!   emitting configured entry signals at fixed polling cycles

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod replay;

pub use bootstrap::{Orchestrator, OrchestratorHandle, bootstrap};
pub use config::RunnerConfig;
pub use error::{Error, Result};
pub use replay::ReplaySignalSource;
