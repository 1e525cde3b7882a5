//! Shared fixtures for in-crate tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use crate::alerts::{AlertContext, ChannelSender, Delivery, SenderError};
use crate::database::models::ChannelConfig;
use crate::database::{DatabaseImpl, initialize_database};
use crate::pool::open_pool;
use crate::scheduler::{CheckJob, JobQueue, QueueError, RepeatingJob};

/// Temporary database; keep the `TempDir` alive for the test's duration
pub async fn create_test_database() -> Result<(TempDir, Arc<DatabaseImpl>)> {
    let temp_dir = tempfile::tempdir()?;
    let pool = open_pool(temp_dir.path().join("test.db"), 4).await?;

    {
        let conn = pool.get().await.map_err(|e| anyhow::anyhow!("{e}"))?;
        initialize_database(&conn).await?;
    }

    Ok((temp_dir, Arc::new(DatabaseImpl::new_from_pool(pool))))
}

/// Run raw SQL bound to a monitor id, for rows the typed API refuses to write
pub async fn execute_raw(db: &DatabaseImpl, sql: &str, monitor_id: uuid::Uuid) -> Result<()> {
    let conn = db.get_conn().await?;
    conn.execute(sql, libsql::params![monitor_id.to_string()]).await?;
    Ok(())
}

/// Run raw SQL statements with no parameters
pub async fn execute_script(db: &DatabaseImpl, sql: &str) -> Result<()> {
    let conn = db.get_conn().await?;
    conn.execute_batch(sql).await?;
    Ok(())
}

/// Channel sender that remembers every alert it was handed
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(ChannelConfig, AlertContext)>>,
    fail: bool,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { sent: Mutex::default(), fail: true })
    }

    pub fn sent(&self) -> Vec<(ChannelConfig, AlertContext)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<AlertContext> {
        self.sent().into_iter().map(|(_, ctx)| ctx).collect()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    async fn send(&self, channel: &ChannelConfig, context: &AlertContext) -> Result<Delivery, SenderError> {
        self.sent.lock().unwrap().push((channel.clone(), context.clone()));
        if self.fail {
            return Err(SenderError::SendFailed("chat not found".into()));
        }
        Ok(Delivery::Sent)
    }
}

/// Job queue that only records registrations
#[derive(Default)]
pub struct FakeQueue {
    jobs: Mutex<Vec<RepeatingJob>>,
    pub fail_monitor: Mutex<Option<uuid::Uuid>>,
}

impl FakeQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn jobs(&self) -> Vec<RepeatingJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for FakeQueue {
    async fn enqueue_repeating(&self, key: &str, job: CheckJob, every: Duration) -> Result<(), QueueError> {
        if *self.fail_monitor.lock().unwrap() == Some(job.monitor_id()) {
            return Err(QueueError::Backend("connection reset".into()));
        }
        let mut jobs = self.jobs.lock().unwrap();
        jobs.retain(|j| j.key != key);
        jobs.push(RepeatingJob { key: key.to_string(), job, every });
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool, QueueError> {
        // No one-shot jobs in this fake.
        Ok(false)
    }

    async fn list_repeating(&self) -> Result<Vec<RepeatingJob>, QueueError> {
        Ok(self.jobs())
    }

    async fn remove_repeating(&self, key: &str) -> Result<bool, QueueError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.key != key);
        Ok(jobs.len() != before)
    }
}
