/// Scheduling layer
///
/// The [`ScheduleManager`] keeps the job queue's recurring registrations in
/// line with the set of active monitors. The queue itself is a capability
/// ([`JobQueue`]); [`LocalJobQueue`] is the in-process implementation.
pub mod local;
pub mod manager;
pub mod queue;

pub use local::{FailedJob, LocalJobQueue, LocalQueueOptions};
pub use manager::{ScheduleDefaults, ScheduleManager, ScheduleOutcome, ScheduleSummary};
pub use queue::{CheckJob, JobHandler, JobQueue, QueueError, RepeatingJob, RetryPolicy, job_key};
