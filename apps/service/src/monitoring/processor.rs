//! Check processing.
//!
//! The [`CheckProcessor`] is what the job queue runs: it loads the monitor,
//! executes the probe or heartbeat evaluation, persists the outcome
//! together with its incident change, and dispatches alerts on
//! transitions. It also serves heartbeat pings and one-off test probes.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::checker::HttpChecker;
use super::heartbeat::{HeartbeatVerdict, HeartbeatWindow};
use super::transition::{AlertKind, Transition};
use super::types::{CheckStatus, ProbeOutcome};
use super::validation::validate_http_url;
use crate::alerts::{AlertContext, AlertDispatcher, DispatchSummary};
use crate::database::models::{HttpProbeConfig, Monitor, MonitorConfig, MonitorType, NewCheckResult};
use crate::database::{Database, IncidentChange};
use crate::error::{EngineError, EngineResult};
use crate::scheduler::{CheckJob, JobHandler};

/// What one job invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckReport {
    /// The monitor was deleted after the job was registered
    MonitorMissing,
    Paused,
    /// The job kind does not match the monitor's type
    Unsupported,
    /// Never pinged and still inside the first window
    AwaitingFirstPing,
    /// Same status as last time; nothing written
    Unchanged(CheckStatus),
    Recorded { status: CheckStatus, incident: IncidentChange, alert: Option<DispatchSummary> },
}

/// Answer to a heartbeat ping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingReceipt {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub recorded: bool,
}

/// Body of an ad-hoc probe request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProbeRequest {
    pub url: String,
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    pub expected_status_code: Option<u16>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProbeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestProbeResult {
    fn failed(error: impl Into<String>) -> Self {
        Self { success: false, response_time: None, error: Some(error.into()) }
    }
}

impl From<ProbeOutcome> for TestProbeResult {
    fn from(outcome: ProbeOutcome) -> Self {
        Self {
            success: outcome.status == CheckStatus::Up,
            response_time: outcome.response_time_ms,
            error: outcome.error_message,
        }
    }
}

pub struct CheckProcessor {
    database: Arc<dyn Database>,
    checker: Arc<HttpChecker>,
    dispatcher: Arc<AlertDispatcher>,
}

impl CheckProcessor {
    pub fn new(database: Arc<dyn Database>, checker: Arc<HttpChecker>, dispatcher: Arc<AlertDispatcher>) -> Self {
        Self { database, checker, dispatcher }
    }

    /// Load a monitor that is due for a check, or explain why not
    async fn load_due(&self, monitor_id: Uuid) -> Result<Result<Monitor, CheckReport>> {
        let Some(monitor) = self.database.get_monitor(monitor_id).await? else {
            error!("Monitor {} not found", monitor_id);
            return Ok(Err(CheckReport::MonitorMissing));
        };

        if monitor.is_paused {
            debug!("Monitor {} is paused, skipping check", monitor_id);
            return Ok(Err(CheckReport::Paused));
        }

        Ok(Ok(monitor))
    }

    /// Run one HTTP probe and persist it
    ///
    /// Every probe is written, including repeats of the same status; only
    /// transitions touch incidents and alerts.
    pub async fn process_http_check(&self, monitor_id: Uuid) -> Result<CheckReport> {
        debug!("Processing HTTP check for monitor {}", monitor_id);

        let monitor = match self.load_due(monitor_id).await? {
            Ok(monitor) => monitor,
            Err(report) => return Ok(report),
        };
        let MonitorConfig::Http(config) = &monitor.config else {
            warn!("Monitor {} received an HTTP job but is {}", monitor_id, monitor.monitor_type());
            return Ok(CheckReport::Unsupported);
        };

        let previous = self.database.latest_check_result(monitor_id).await?.map(|r| r.status);
        let outcome = self.checker.probe(config).await;

        debug!(
            "Check result for monitor {}: {} ({}ms)",
            monitor_id,
            outcome.status,
            outcome.response_time_ms.unwrap_or_default()
        );

        let transition = Transition::between(previous, outcome.status, outcome.error_message.as_deref());
        let response_time = outcome.response_time_ms;
        let record = outcome.into_record(monitor_id);

        self.persist_and_alert(&monitor, &transition, record, response_time).await
    }

    /// Evaluate a cron monitor's heartbeat deadline
    ///
    /// Repeats of the last status write nothing.
    pub async fn process_cron_check(&self, monitor_id: Uuid, grace_period_minutes: u32) -> Result<CheckReport> {
        debug!("Processing cron check for monitor {}", monitor_id);

        let monitor = match self.load_due(monitor_id).await? {
            Ok(monitor) => monitor,
            Err(report) => return Ok(report),
        };
        let MonitorConfig::Cron(config) = &monitor.config else {
            warn!("Monitor {} received a cron job but is {}", monitor_id, monitor.monitor_type());
            return Ok(CheckReport::Unsupported);
        };

        let window = HeartbeatWindow {
            expected_interval_minutes: config.expected_interval_minutes,
            grace_period_minutes,
            last_ping_at: monitor.last_ping_at,
            monitor_created_at: monitor.created_at,
        };

        let now = Utc::now();
        let record = match window.evaluate(now) {
            HeartbeatVerdict::AwaitingFirstPing => {
                debug!("Cron monitor {} waiting for initial ping", monitor_id);
                return Ok(CheckReport::AwaitingFirstPing);
            }
            HeartbeatVerdict::OnSchedule => {
                debug!("Cron monitor {} ping is on schedule", monitor_id);
                NewCheckResult::up(monitor_id, now)
            }
            HeartbeatVerdict::Missed { minutes_overdue, message } => {
                warn!("Cron monitor {} missed its deadline by {} minutes", monitor_id, minutes_overdue);
                NewCheckResult::down(monitor_id, message, now)
            }
        };

        let previous = self.database.latest_check_result(monitor_id).await?.map(|r| r.status);
        if previous == Some(record.status) {
            return Ok(CheckReport::Unchanged(record.status));
        }

        let transition = Transition::between(previous, record.status, record.error_message.as_deref());
        self.persist_and_alert(&monitor, &transition, record, None).await
    }

    async fn persist_and_alert(
        &self,
        monitor: &Monitor,
        transition: &Transition,
        record: NewCheckResult,
        response_time_ms: Option<u64>,
    ) -> Result<CheckReport> {
        let recorded = self.database.record_check(&record, &transition.incident).await?;

        if transition.is_status_change() {
            info!(
                "Monitor {} status changed from {} to {}",
                monitor.id,
                transition.previous.map_or("none", |s| s.as_str()),
                transition.current
            );
        }

        let alert = match (transition.alert, &recorded.incident) {
            (Some(AlertKind::Down), IncidentChange::Opened(_) | IncidentChange::AlreadyOpen(_)) => {
                if matches!(recorded.incident, IncidentChange::AlreadyOpen(_)) {
                    warn!("Monitor {} went DOWN while an incident was already open, reusing it", monitor.id);
                }
                let context = AlertContext::for_monitor(monitor, CheckStatus::Down, transition.previous)
                    .with_error(record.error_message.clone())
                    .with_response_time(response_time_ms)
                    .with_timestamp(record.checked_at);
                info!("Monitor {} is DOWN - incident opened", monitor.id);
                self.dispatch(&context).await
            }
            (Some(AlertKind::Recovery), IncidentChange::Resolved(_)) => {
                let context = AlertContext::for_monitor(monitor, CheckStatus::Up, transition.previous)
                    .with_response_time(response_time_ms)
                    .with_timestamp(record.checked_at);
                info!("Monitor {} is UP - incident resolved", monitor.id);
                self.dispatch(&context).await
            }
            (Some(AlertKind::Recovery), _) => {
                warn!("Monitor {} recovered without an open incident, no recovery alert sent", monitor.id);
                None
            }
            _ => None,
        };

        Ok(CheckReport::Recorded { status: record.status, incident: recorded.incident, alert })
    }

    /// Alert failures never fail the check that triggered them
    async fn dispatch(&self, context: &AlertContext) -> Option<DispatchSummary> {
        match self.dispatcher.dispatch(context).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Failed to dispatch alert for monitor {}: {:#}", context.monitor_id, e);
                None
            }
        }
    }

    /// Accept a heartbeat ping for a cron monitor
    pub async fn record_heartbeat(&self, monitor_id: Uuid) -> EngineResult<PingReceipt> {
        let monitor = self.database.get_monitor(monitor_id).await?.ok_or(EngineError::MonitorNotFound(monitor_id))?;

        if monitor.monitor_type() != MonitorType::Cron {
            return Err(EngineError::NotCron(monitor_id));
        }

        let now = Utc::now();
        if monitor.is_paused {
            return Ok(PingReceipt {
                message: "Monitor is paused, ping ignored".to_string(),
                timestamp: now,
                recorded: false,
            });
        }

        let recorded = self.database.record_ping(monitor_id, now).await?;
        if let IncidentChange::Resolved(_) = recorded.incident {
            info!("Cron monitor {} recovered after ping", monitor_id);
            let context =
                AlertContext::for_monitor(&monitor, CheckStatus::Up, Some(CheckStatus::Down)).with_timestamp(now);
            self.dispatch(&context).await;
        }

        debug!("Received ping for cron monitor {}", monitor_id);
        Ok(PingReceipt { message: "Ping received".to_string(), timestamp: now, recorded: true })
    }

    /// Probe a target once without persisting or scheduling anything
    pub async fn test_probe(&self, request: &TestProbeRequest) -> TestProbeResult {
        if request.monitor_type != MonitorType::Http {
            return TestProbeResult::failed(format!(
                "Test checks are only supported for HTTP monitors, got {}",
                request.monitor_type
            ));
        }

        if let Err(e) = validate_http_url(&request.url) {
            return TestProbeResult::failed(e.to_string());
        }

        let mut config = HttpProbeConfig::new(request.url.clone());
        if let Some(code) = request.expected_status_code {
            config.expected_status_codes = vec![code];
        }
        config.expected_keyword = request.keyword.clone().filter(|k| !k.is_empty());

        self.checker.probe(&config).await.into()
    }
}

#[async_trait]
impl JobHandler for CheckProcessor {
    async fn handle(&self, job: &CheckJob) -> Result<()> {
        let report = match job {
            CheckJob::Http { monitor_id, .. } => self.process_http_check(*monitor_id).await?,
            CheckJob::Cron { monitor_id, grace_period_minutes, .. } => {
                self.process_cron_check(*monitor_id, *grace_period_minutes).await?
            }
        };

        debug!("Job for monitor {} completed: {:?}", job.monitor_id(), report);
        Ok(())
    }
}
