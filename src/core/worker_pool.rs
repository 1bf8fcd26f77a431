//! Fixed-size worker pool draining one shared bounded queue.
//!
//! Each worker is a dedicated OS thread with its own single-threaded tokio
//! runtime, so async work items never block the caller's runtime.
//!
//! # Key Features
//!
//! - **Backpressure**: `enqueue_work` blocks while the queue is full
//! - **Cooperative stop**: workers observe `stop` only at dequeue boundaries
//! - **Restartable**: a stopped pool keeps its queued items for the next `start`
//! - **Supervised**: panicking work is reported to a [`Supervisor`](crate::core::Supervisor)
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_jobs::config::WorkerPoolConfig;
//! use prometheus_jobs::core::{work_item, WorkerPool};
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new()
//!         .with_worker_count(4)
//!         .with_max_queue_depth(64),
//! )?;
//!
//! pool.enqueue_work(work_item(|_ctx| async move { Ok(()) }));
//! pool.wait_until_done();
//! ```

mod native;
mod worker;

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Receiver;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerPoolConfig;
use crate::core::{Supervisor, WorkItem};

pub use native::WorkerPool;

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of workers.
    pub worker_count: usize,
    /// Workers whose active flag is set.
    pub active_workers: usize,
    /// Items currently executing.
    pub active_tasks: u64,
    /// Items waiting in the queue.
    pub queued_tasks: u64,
    /// Items that finished without error.
    pub completed_tasks: u64,
    /// Items that returned an error.
    pub failed_tasks: u64,
    /// Items discarded from the queue without running.
    pub discarded_tasks: u64,
    /// Total items submitted.
    pub submitted_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub discarded_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
    /// Submitted and not yet finished or discarded. Incremented before the
    /// item reaches the queue so there is no window where work is invisible.
    pub outstanding: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, active_workers: usize, queued: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_workers,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: queued as u64,
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            discarded_tasks: self.discarded_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
        }
    }
}

/// State shared by reference between the pool and every worker.
pub(crate) struct PoolShared {
    pub queue: Receiver<WorkItem>,
    pub counters: PoolCounters,
    pub supervisor: Box<dyn Supervisor>,
    pub cancel: CancellationToken,
    pub config: WorkerPoolConfig,
}

/// Marks one item as executing for as long as it is alive.
///
/// Dropping releases the in-flight and outstanding counts, including during
/// an unwind out of a panicking item.
pub(crate) struct InFlight<'a> {
    counters: &'a PoolCounters,
}

impl<'a> InFlight<'a> {
    pub fn enter(counters: &'a PoolCounters) -> Self {
        counters.active_tasks.fetch_add(1, Ordering::SeqCst);
        Self { counters }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counters.active_tasks.fetch_sub(1, Ordering::SeqCst);
        self.counters.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
