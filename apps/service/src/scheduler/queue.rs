//! Job queue capability.
//!
//! The schedule manager only registers job descriptors; whoever implements
//! [`JobQueue`] owns timing, retries and the failed-job log.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default number of attempts per firing
pub const DEFAULT_JOB_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles on each further retry
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);
/// Failed jobs kept for inspection
pub const DEFAULT_FAILED_JOBS_KEPT: usize = 50;

/// Deterministic job key of a monitor
pub fn job_key(monitor_id: Uuid) -> String {
    format!("monitor-{monitor_id}")
}

/// Payload of a scheduled check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CheckJob {
    #[serde(rename_all = "camelCase")]
    Http { monitor_id: Uuid, owner_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Cron { monitor_id: Uuid, owner_id: Uuid, grace_period_minutes: u32 },
}

impl CheckJob {
    pub fn monitor_id(&self) -> Uuid {
        match self {
            CheckJob::Http { monitor_id, .. } | CheckJob::Cron { monitor_id, .. } => *monitor_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CheckJob::Http { .. } => "http",
            CheckJob::Cron { .. } => "cron",
        }
    }
}

/// A recurring registration as reported by the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatingJob {
    pub key: String,
    pub job: CheckJob,
    pub every: Duration,
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Invalid repeat interval for job {0}: interval must be positive")]
    InvalidInterval(String),
    #[error("Job queue is shut down")]
    Closed,
    #[error("Job queue backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Register `job` to fire every `every` under `key`, replacing any
    /// registration with the same key
    async fn enqueue_repeating(&self, key: &str, job: CheckJob, every: Duration) -> Result<(), QueueError>;

    /// Remove the pending job instance with this key; `false` when absent
    async fn remove(&self, key: &str) -> Result<bool, QueueError>;

    /// All recurring registrations
    async fn list_repeating(&self) -> Result<Vec<RepeatingJob>, QueueError>;

    /// Remove a recurring registration; `false` when absent
    async fn remove_repeating(&self, key: &str) -> Result<bool, QueueError>;
}

/// Consumer side of the queue
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// An `Err` is a job failure and is retried; DOWN outcomes are not errors
    async fn handle(&self, job: &CheckJob) -> anyhow::Result<()>;
}

/// Retry settings applied to each firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: DEFAULT_JOB_ATTEMPTS, initial_delay: DEFAULT_BACKOFF }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt` (1-based); the first attempt runs immediately
    pub fn delay_before(&self, attempt: u32) -> Duration {
        match attempt {
            0 | 1 => Duration::ZERO,
            n => self.initial_delay.saturating_mul(2u32.saturating_pow(n - 2)),
        }
    }
}
