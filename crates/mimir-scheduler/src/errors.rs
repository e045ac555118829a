//! Error type for the scheduler/execution-monitor crate — wraps the two
//! failure sources its operations touch: a malformed cron expression and a
//! persistence-layer failure.

use mimir_domain::DomainError;
use mimir_persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid schedule: {0}")]
    InvalidSchedule(#[from] DomainError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("job not found: {0}")]
    JobNotFound(uuid::Uuid),
}
