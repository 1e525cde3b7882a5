/// Monitoring engine module - executes checks and interprets their outcomes
///
/// This module is responsible for:
/// - Executing HTTP probes and evaluating cron heartbeats
/// - Mapping outcomes onto status transitions and incidents
/// - Validating per-type monitor configuration
/// - Processing scheduled jobs, pings and test probes
pub mod checker;
pub mod heartbeat;
pub mod processor;
pub mod transition;
pub mod types;
pub mod validation;

pub use checker::HttpChecker;
pub use processor::{CheckProcessor, CheckReport, PingReceipt, TestProbeRequest, TestProbeResult};
pub use types::{CheckStatus, ProbeOutcome};
