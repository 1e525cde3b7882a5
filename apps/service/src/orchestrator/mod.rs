
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::alerts::{AlertDispatcher, AlertThrottle, TelegramSender};
use crate::config::Config;
use crate::database::models::ChannelType;
use crate::database::{Database, DatabaseImpl, initialize_database};
use crate::monitoring::{CheckProcessor, HttpChecker};
use crate::pool::LibsqlPool;
use crate::scheduler::{
    JobQueue, LocalJobQueue, LocalQueueOptions, RetryPolicy, ScheduleDefaults, ScheduleManager, ScheduleSummary,
};

/// Main orchestrator for the Pulse engine
pub struct Orchestrator {
    config: Arc<Config>,
    database: Arc<dyn Database>,
    throttle: Arc<AlertThrottle>,
    processor: Arc<CheckProcessor>,
    queue: LocalJobQueue,
    scheduler: Arc<ScheduleManager>,
}

impl Orchestrator {
    /// Create an orchestrator on top of an open pool
    pub async fn new(config: Config, pool: LibsqlPool) -> Result<Self> {
        let config = Arc::new(config);

        // Initialize database schema
        info!("Initializing database schema...");
        {
            let conn = pool.get().await.map_err(|e| anyhow::anyhow!("Failed to get database connection: {e}"))?;
            initialize_database(&conn).await?;
        }
        let database: Arc<dyn Database> = Arc::new(DatabaseImpl::new_from_pool(pool));

        let throttle = Arc::new(AlertThrottle::new(i64::from(config.engine.alert_throttle_minutes)));
        let telegram = TelegramSender::new(config.telegram.bot_token.clone(), config.telegram.api_base.clone())?;
        let dispatcher = Arc::new(
            AlertDispatcher::new(Arc::clone(&database), Arc::clone(&throttle))
                .with_sender(ChannelType::Telegram, Arc::new(telegram)),
        );

        let checker = Arc::new(HttpChecker::new()?);
        let processor = Arc::new(CheckProcessor::new(Arc::clone(&database), checker, dispatcher));

        let queue = LocalJobQueue::new(
            processor.clone(),
            LocalQueueOptions {
                retry: RetryPolicy {
                    attempts: config.queue.attempts,
                    initial_delay: Duration::from_secs(config.queue.backoff_seconds),
                },
                max_concurrent_jobs: config.queue.max_concurrent_jobs,
                failed_jobs_kept: config.queue.failed_jobs_kept,
            },
        );

        let scheduler = Arc::new(
            ScheduleManager::new(Arc::new(queue.clone()) as Arc<dyn JobQueue>, Arc::clone(&database))
                .with_defaults(ScheduleDefaults {
                    http_interval_minutes: config.engine.default_http_interval_minutes,
                    grace_period_minutes: config.engine.default_grace_period_minutes,
                }),
        );

        Ok(Self { config, database, throttle, processor, queue, scheduler })
    }

    /// Schedule every active monitor
    pub async fn start(&self) -> Result<ScheduleSummary> {
        info!("Starting Pulse engine...");
        let summary = self.scheduler.initialize_schedules().await?;
        Ok(summary)
    }

    /// Stop all recurring jobs; in-flight checks run to completion
    pub fn shutdown(&self) {
        info!("Stopping Pulse engine...");
        self.queue.shutdown();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> Arc<dyn Database> {
        Arc::clone(&self.database)
    }

    pub fn throttle(&self) -> Arc<AlertThrottle> {
        Arc::clone(&self.throttle)
    }

    pub fn processor(&self) -> Arc<CheckProcessor> {
        Arc::clone(&self.processor)
    }

    pub fn scheduler(&self) -> Arc<ScheduleManager> {
        Arc::clone(&self.scheduler)
    }

    pub fn queue(&self) -> &LocalJobQueue {
        &self.queue
    }
}
