//! Pulse check scheduling and execution engine.
//!
//! Turns raw probe outcomes (HTTP requests, cron heartbeats) into stored
//! check results, incidents and throttled alerts. [`Orchestrator`] wires
//! the pieces together for the server binary.

pub mod alerts;
pub mod config;
pub mod database;
pub mod error;
pub mod monitoring;
pub mod orchestrator;
pub mod pool;
pub mod scheduler;

pub use error::{EngineError, EngineResult};
pub use orchestrator::Orchestrator;

#[cfg(test)]
pub(crate) mod test_support;
