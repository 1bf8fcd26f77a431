//! Native `WorkerPool` using dedicated OS threads.
//!
//! # Design
//!
//! - **One queue**: a bounded crossbeam channel shared by every worker
//! - **Blocking enqueue**: a full queue parks the producer until a worker drains it
//! - **No preemption**: `stop` clears flags; running items always finish
//! - **Exact drain tracking**: an outstanding counter covers queued and running items

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::WorkerPoolConfig;
use crate::core::{SchedulerError, Supervisor, TracingSupervisor, WorkItem};

use super::worker::Worker;
use super::{PoolCounters, PoolShared, PoolStats};

/// Fixed set of workers sharing one bounded FIFO queue of work items.
///
/// Items are dequeued in submission order across the whole pool; which
/// worker picks up a given item, and the order in which items on different
/// workers complete, is not defined.
pub struct WorkerPool {
    sender: Sender<WorkItem>,
    shared: Arc<PoolShared>,
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Create a pool and immediately start all of its workers.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the configuration is invalid
    /// - `SchedulerError::WorkerSpawn` if a worker thread cannot be spawned
    pub fn new(config: WorkerPoolConfig) -> Result<Self, SchedulerError> {
        Self::with_supervisor(config, TracingSupervisor)
    }

    /// Like [`WorkerPool::new`], reporting worker panics to `supervisor`.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerPool::new`].
    pub fn with_supervisor<S>(config: WorkerPoolConfig, supervisor: S) -> Result<Self, SchedulerError>
    where
        S: Supervisor,
    {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (sender, queue) = bounded::<WorkItem>(config.max_queue_depth);
        let shared = Arc::new(PoolShared {
            queue,
            counters: PoolCounters::default(),
            supervisor: Box::new(supervisor),
            cancel: CancellationToken::new(),
            config,
        });

        let workers = (0..shared.config.worker_count)
            .map(|id| Worker::new(id, Arc::clone(&shared)))
            .collect();

        let pool = Self {
            sender,
            shared,
            workers,
        };
        pool.start()?;

        info!(
            worker_count = pool.shared.config.worker_count,
            max_queue_depth = pool.shared.config.max_queue_depth,
            "WorkerPool initialized"
        );

        Ok(pool)
    }

    /// Append a work item to the shared queue.
    ///
    /// Blocks while the queue is full. Items enqueued while the pool is
    /// stopped wait for the next [`start`](Self::start).
    pub fn enqueue_work(&self, item: WorkItem) {
        let counters = &self.shared.counters;
        counters.outstanding.fetch_add(1, Ordering::SeqCst);
        counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);

        if self.sender.send(item).is_err() {
            // The pool holds a receiver, so this only happens mid-teardown.
            counters.outstanding.fetch_sub(1, Ordering::SeqCst);
            counters.discarded_tasks.fetch_add(1, Ordering::Relaxed);
            error!("Worker pool queue disconnected, work item dropped");
        }
    }

    /// Activate every inactive worker. Already active workers are left alone.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::WorkerSpawn` if a worker thread cannot be
    /// spawned; workers launched before the failure stay active.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut launched = 0usize;
        for worker in &self.workers {
            if worker.start()? {
                launched += 1;
            }
        }
        if launched > 0 {
            debug!(launched = launched, "Worker pool started");
        }
        Ok(())
    }

    /// Cooperatively deactivate every worker.
    ///
    /// Running items finish; queued items stay queued.
    pub fn stop(&self) {
        for worker in &self.workers {
            worker.stop();
        }
        debug!("Worker pool stopped");
    }

    /// True if at least one worker is active.
    #[must_use]
    pub fn active(&self) -> bool {
        self.workers.iter().any(Worker::is_active)
    }

    /// True while any item is queued or executing.
    #[must_use]
    pub fn is_work_remaining(&self) -> bool {
        self.shared.counters.outstanding.load(Ordering::SeqCst) > 0 || !self.shared.queue.is_empty()
    }

    /// Block until no work remains, polling at the configured drain interval.
    ///
    /// Never returns while the pool is stopped with items still queued.
    pub fn wait_until_done(&self) {
        let poll = self.shared.config.drain_poll();
        while self.is_work_remaining() {
            thread::sleep(poll);
        }
    }

    /// Like [`wait_until_done`](Self::wait_until_done) but gives up after
    /// `timeout`. Returns `true` if the pool drained in time.
    #[must_use]
    pub fn wait_until_done_timeout(&self, timeout: Duration) -> bool {
        let poll = self.shared.config.drain_poll();
        let deadline = Instant::now() + timeout;
        while self.is_work_remaining() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(poll.min(deadline - now));
        }
        true
    }

    /// Drop every item still waiting in the queue. Running items are not
    /// affected. Returns the number of items discarded.
    pub fn discard_queued(&self) -> usize {
        let counters = &self.shared.counters;
        let mut discarded = 0usize;
        while let Ok(item) = self.shared.queue.try_recv() {
            drop(item);
            counters.outstanding.fetch_sub(1, Ordering::SeqCst);
            counters.discarded_tasks.fetch_add(1, Ordering::Relaxed);
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded = discarded, "Discarded queued work items");
        }
        discarded
    }

    /// Number of workers, fixed at construction.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Capacity of the shared queue.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.shared.config.max_queue_depth
    }

    /// Token that is cancelled when the pool is dropped. Every work context
    /// carries a child of it.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let active_workers = self.workers.iter().filter(|w| w.is_active()).count();
        self.shared
            .counters
            .snapshot(self.workers.len(), active_workers, self.shared.queue.len())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers are not joined; each exits within one idle poll.
        self.stop();
        self.shared.cancel.cancel();
        debug!("WorkerPool dropped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
