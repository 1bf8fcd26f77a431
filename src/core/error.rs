//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by pool, job queue, and event queue construction or
/// registration.
///
/// Failures inside work bodies never surface here; they are logged at the
/// point of execution.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job with this ID is already registered.
    #[error("duplicate job id: {0}")]
    DuplicateJob(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The OS refused to spawn a worker or scheduler thread.
    #[error("failed to spawn thread: {0}")]
    WorkerSpawn(String),
}

/// Application-facing result using anyhow for work bodies and higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
