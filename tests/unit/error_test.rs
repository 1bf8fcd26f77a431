//! Tests for error types

use prometheus_jobs::config::WorkerPoolConfig;
use prometheus_jobs::core::{SchedulerError, WorkerPool};

#[test]
fn test_duplicate_job_error() {
    let err = SchedulerError::DuplicateJob("reindex".to_string());
    assert_eq!(format!("{err}"), "duplicate job id: reindex");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_invalid_pool_config_is_rejected() {
    let err = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(0)).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[test]
fn test_scheduler_error_into_anyhow() {
    let err: anyhow::Error = SchedulerError::WorkerSpawn("out of threads".to_string()).into();
    assert_eq!(err.to_string(), "failed to spawn thread: out of threads");
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
