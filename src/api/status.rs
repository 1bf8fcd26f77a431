//! Job status payloads.
//!
//! These mirror what `fetch_job_ids` and `fetch_state` expose, in a shape an
//! HTTP handler can serialize directly.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::core::{JobQueue, PoolStats};

/// State of one registered job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job identifier.
    pub id: String,
    /// Queued or executing.
    pub is_running: bool,
    /// Start of the most recent run.
    pub last_run: Option<DateTime<Local>>,
}

/// Pool utilization summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Number of workers.
    pub workers: usize,
    /// Workers currently active.
    pub active_workers: usize,
    /// Items waiting in the queue.
    pub queued: u64,
    /// Items executing.
    pub running: u64,
    /// Items that returned an error.
    pub failed: u64,
}

impl From<PoolStats> for PoolStatus {
    fn from(stats: PoolStats) -> Self {
        Self {
            workers: stats.worker_count,
            active_workers: stats.active_workers,
            queued: stats.queued_tasks,
            running: stats.active_tasks,
            failed: stats.failed_tasks,
        }
    }
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Scheduler loop running.
    pub scheduler_active: bool,
    /// Pool summary.
    pub pool: PoolStatus,
}

/// Status of every job in `queue`, sorted by ID.
#[must_use]
pub fn job_statuses(queue: &JobQueue) -> Vec<JobStatus> {
    let mut statuses: Vec<JobStatus> = queue
        .fetch_job_ids()
        .into_iter()
        .map(|id| {
            let (is_running, last_run) = queue.fetch_state(&id);
            JobStatus {
                id,
                is_running,
                last_run,
            }
        })
        .collect();
    statuses.sort_by(|a, b| a.id.cmp(&b.id));
    statuses
}

/// Health payload for `queue`.
#[must_use]
pub fn health(queue: &JobQueue) -> Health {
    Health {
        scheduler_active: queue.scheduler_active(),
        pool: queue.pool().stats().into(),
    }
}
