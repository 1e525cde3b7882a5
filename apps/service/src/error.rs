use thiserror::Error;
use uuid::Uuid;

use crate::monitoring::validation::ValidationError;
use crate::scheduler::QueueError;

/// Errors surfaced by the engine's public operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Monitor not found: {0}")]
    MonitorNotFound(Uuid),

    #[error("Monitor {0} is not a cron monitor")]
    NotCron(Uuid),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
