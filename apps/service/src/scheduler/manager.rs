use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use uuid::Uuid;

use super::queue::{CheckJob, JobQueue, job_key};
use crate::database::Database;
use crate::database::models::{DEFAULT_GRACE_PERIOD_MINUTES, DEFAULT_HTTP_INTERVAL_MINUTES, Monitor, MonitorConfig};
use crate::error::{EngineError, EngineResult};
use crate::monitoring::validation::validate_monitor;

/// What `schedule_monitor` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled { key: String, every: Duration },
    Paused,
    /// Monitor type has no scheduled check yet
    Unsupported,
}

/// Result of scheduling every active monitor at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub total: usize,
    pub scheduled: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fallbacks for monitors stored without their own cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDefaults {
    pub http_interval_minutes: u32,
    pub grace_period_minutes: u32,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            http_interval_minutes: DEFAULT_HTTP_INTERVAL_MINUTES,
            grace_period_minutes: DEFAULT_GRACE_PERIOD_MINUTES,
        }
    }
}

/// Keeps one recurring job per active monitor
pub struct ScheduleManager {
    queue: Arc<dyn JobQueue>,
    database: Arc<dyn Database>,
    defaults: ScheduleDefaults,
}

fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}

impl ScheduleManager {
    pub fn new(queue: Arc<dyn JobQueue>, database: Arc<dyn Database>) -> Self {
        Self { queue, database, defaults: ScheduleDefaults::default() }
    }

    pub fn with_defaults(mut self, defaults: ScheduleDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Register (or replace) the recurring check of a monitor
    pub async fn schedule_monitor(&self, monitor: &Monitor) -> EngineResult<ScheduleOutcome> {
        if monitor.is_paused {
            debug!("Monitor {} is paused, skipping scheduling", monitor.id);
            return Ok(ScheduleOutcome::Paused);
        }

        validate_monitor(monitor)?;

        let (job, every) = match &monitor.config {
            MonitorConfig::Http(_) => {
                let interval = monitor.interval_or(self.defaults.http_interval_minutes);
                (CheckJob::Http { monitor_id: monitor.id, owner_id: monitor.owner_id }, minutes(interval))
            }
            MonitorConfig::Cron(cron) => {
                let grace = monitor.grace_period_or(self.defaults.grace_period_minutes);
                let job =
                    CheckJob::Cron { monitor_id: monitor.id, owner_id: monitor.owner_id, grace_period_minutes: grace };
                (job, minutes(cron.expected_interval_minutes + grace))
            }
            MonitorConfig::Ssl(_) => {
                debug!("SSL monitor {} scheduling not yet implemented", monitor.id);
                return Ok(ScheduleOutcome::Unsupported);
            }
        };

        self.remove_scheduled_job(monitor.id).await?;

        let key = job_key(monitor.id);
        self.queue.enqueue_repeating(&key, job, every).await?;

        info!("Scheduled {} monitor {} every {} minutes", monitor.monitor_type(), monitor.id, every.as_secs() / 60);
        Ok(ScheduleOutcome::Scheduled { key, every })
    }

    /// Remove every registration belonging to a monitor; absent jobs are fine
    pub async fn remove_scheduled_job(&self, monitor_id: Uuid) -> EngineResult<()> {
        let key = job_key(monitor_id);
        let id = monitor_id.to_string();

        if self.queue.remove(&key).await? {
            debug!("Removed job {}", key);
        }

        for repeating in self.queue.list_repeating().await? {
            if repeating.key == key || repeating.key.contains(&id) {
                self.queue.remove_repeating(&repeating.key).await?;
                debug!("Removed repeatable job {} for monitor {}", repeating.key, monitor_id);
            }
        }

        Ok(())
    }

    /// Apply an edited monitor: paused monitors lose their job, others are rescheduled
    pub async fn update_schedule(&self, monitor: &Monitor) -> EngineResult<ScheduleOutcome> {
        if monitor.is_paused {
            self.remove_scheduled_job(monitor.id).await?;
            return Ok(ScheduleOutcome::Paused);
        }
        self.schedule_monitor(monitor).await
    }

    /// Persist the paused flag and drop the schedule
    pub async fn pause_monitor(&self, monitor_id: Uuid) -> EngineResult<()> {
        self.database.set_paused(monitor_id, true).await?.ok_or(EngineError::MonitorNotFound(monitor_id))?;
        self.remove_scheduled_job(monitor_id).await?;
        info!("Paused monitor {}", monitor_id);
        Ok(())
    }

    /// Clear the paused flag and schedule from the freshly stored record
    ///
    /// A monitor that cannot be scheduled stays paused.
    pub async fn resume_monitor(&self, monitor_id: Uuid) -> EngineResult<ScheduleOutcome> {
        let stored = self.database.get_monitor(monitor_id).await?.ok_or(EngineError::MonitorNotFound(monitor_id))?;
        validate_monitor(&stored)?;

        let monitor =
            self.database.set_paused(monitor_id, false).await?.ok_or(EngineError::MonitorNotFound(monitor_id))?;

        match self.schedule_monitor(&monitor).await {
            Ok(outcome) => {
                info!("Resumed monitor {}", monitor_id);
                Ok(outcome)
            }
            Err(e) => {
                error!("Failed to schedule resumed monitor {}, keeping it paused: {}", monitor_id, e);
                self.database.set_paused(monitor_id, true).await?;
                Err(e)
            }
        }
    }

    /// Drop the schedule and delete the monitor with its results and incidents
    pub async fn delete_monitor(&self, monitor_id: Uuid) -> EngineResult<bool> {
        self.remove_scheduled_job(monitor_id).await?;
        let deleted = self.database.delete_monitor(monitor_id).await?;
        info!("Deleted monitor {} from scheduler", monitor_id);
        Ok(deleted)
    }

    /// Schedule every non-paused monitor; one failure never stops the rest
    pub async fn initialize_schedules(&self) -> EngineResult<ScheduleSummary> {
        info!("Initializing monitor schedules...");

        let active = self.database.get_active_monitors().await?;
        let mut summary = ScheduleSummary {
            total: active.monitors.len() + active.unreadable,
            failed: active.unreadable,
            ..Default::default()
        };

        for monitor in &active.monitors {
            match self.schedule_monitor(monitor).await {
                Ok(ScheduleOutcome::Scheduled { .. }) => summary.scheduled += 1,
                Ok(_) => summary.skipped += 1,
                Err(e) => {
                    error!("Failed to schedule monitor {}: {}", monitor.id, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Initialized {} monitor schedules ({} scheduled, {} skipped, {} failed)",
            summary.total, summary.scheduled, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}
