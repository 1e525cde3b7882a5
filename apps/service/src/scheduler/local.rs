//! In-process job queue driven by tokio timers.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Semaphore, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::queue::{CheckJob, DEFAULT_FAILED_JOBS_KEPT, JobHandler, JobQueue, QueueError, RepeatingJob, RetryPolicy};

/// A firing that exhausted its attempts
#[derive(Debug, Clone)]
pub struct FailedJob {
    pub key: String,
    pub job: CheckJob,
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct LocalQueueOptions {
    pub retry: RetryPolicy,
    pub max_concurrent_jobs: usize,
    pub failed_jobs_kept: usize,
}

impl Default for LocalQueueOptions {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(), max_concurrent_jobs: 16, failed_jobs_kept: DEFAULT_FAILED_JOBS_KEPT }
    }
}

struct Registration {
    job: CheckJob,
    every: Duration,
    stop: watch::Sender<bool>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        // Receivers must observe `true` even after the sender is gone.
        self.stop.send_replace(true);
    }
}

struct Inner {
    handler: Arc<dyn JobHandler>,
    options: LocalQueueOptions,
    permits: Semaphore,
    registrations: Mutex<HashMap<String, Registration>>,
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    failed: Mutex<VecDeque<FailedJob>>,
    closed: AtomicBool,
}

/// Job queue running one timer task per registration.
///
/// Invocations of the same key never overlap, including across
/// re-registration. Invocations of different keys run in parallel up to
/// `max_concurrent_jobs`.
#[derive(Clone)]
pub struct LocalJobQueue {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LocalJobQueue {
    pub fn new(handler: Arc<dyn JobHandler>, options: LocalQueueOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler,
                options,
                permits: Semaphore::new(options.max_concurrent_jobs.max(1)),
                registrations: Mutex::new(HashMap::new()),
                key_locks: Mutex::new(HashMap::new()),
                failed: Mutex::new(VecDeque::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Most recent failed jobs, oldest first
    pub fn failed_jobs(&self) -> Vec<FailedJob> {
        lock(&self.inner.failed).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.registrations).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every driver and refuse new registrations
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let drained = {
            let mut registrations = lock(&self.inner.registrations);
            let count = registrations.len();
            registrations.clear();
            count
        };
        self.inner.permits.close();
        info!("Local job queue shut down, {} registrations dropped", drained);
    }
}

impl Inner {
    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = lock(&self.key_locks);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    fn forget_key_lock(&self, key: &str) {
        let mut locks = lock(&self.key_locks);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    async fn drive(self: Arc<Self>, key: String, job: CheckJob, every: Duration, mut stop: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.changed() => break,
            }
            if *stop.borrow() {
                break;
            }

            self.run_firing(&key, &job, &mut stop).await;
        }

        debug!("Job driver for {} stopped", key);
    }

    async fn run_firing(&self, key: &str, job: &CheckJob, stop: &mut watch::Receiver<bool>) {
        let key_lock = self.key_lock(key);
        let _running = key_lock.lock().await;
        if *stop.borrow() {
            return;
        }

        let attempts = self.options.retry.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let delay = self.options.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stop.changed() => {}
                }
            }
            if *stop.borrow() {
                debug!("Retry of {} cancelled, registration removed", key);
                return;
            }

            let Ok(_permit) = self.permits.acquire().await else {
                return;
            };

            match self.handler.handle(job).await {
                Ok(()) => {
                    debug!("Job {} completed (attempt {}/{})", key, attempt, attempts);
                    return;
                }
                Err(e) => {
                    warn!("Job {} attempt {}/{} failed: {:#}", key, attempt, attempts, e);
                    last_error = format!("{e:#}");
                }
            }
        }

        error!("Job {} for monitor {} failed after {} attempts: {}", key, job.monitor_id(), attempts, last_error);
        self.record_failure(FailedJob {
            key: key.to_string(),
            job: job.clone(),
            attempts,
            error: last_error,
            failed_at: Utc::now(),
        });
    }

    fn record_failure(&self, failed: FailedJob) {
        let capacity = self.options.failed_jobs_kept;
        if capacity == 0 {
            return;
        }
        let mut list = lock(&self.failed);
        while list.len() >= capacity {
            list.pop_front();
        }
        list.push_back(failed);
    }
}

#[async_trait]
impl JobQueue for LocalJobQueue {
    async fn enqueue_repeating(&self, key: &str, job: CheckJob, every: Duration) -> Result<(), QueueError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        if every.is_zero() {
            return Err(QueueError::InvalidInterval(key.to_string()));
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let replaced = {
            let mut registrations = lock(&self.inner.registrations);
            registrations.insert(key.to_string(), Registration { job: job.clone(), every, stop: stop_tx })
        };
        if replaced.is_some() {
            debug!("Replaced existing registration for {}", key);
        }

        tokio::spawn(Arc::clone(&self.inner).drive(key.to_string(), job, every, stop_rx));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, QueueError> {
        // One registration per key, so the pending instance is the registration.
        self.remove_repeating(key).await
    }

    async fn list_repeating(&self) -> Result<Vec<RepeatingJob>, QueueError> {
        let registrations = lock(&self.inner.registrations);
        let mut jobs: Vec<RepeatingJob> = registrations
            .iter()
            .map(|(key, r)| RepeatingJob { key: key.clone(), job: r.job.clone(), every: r.every })
            .collect();
        jobs.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(jobs)
    }

    async fn remove_repeating(&self, key: &str) -> Result<bool, QueueError> {
        let removed = lock(&self.inner.registrations).remove(key);
        self.inner.forget_key_lock(key);
        Ok(removed.is_some())
    }
}
