//! Recurring job scheduler on top of a [`WorkerPool`].
//!
//! Jobs are registered once under a unique ID and run on the pool whenever
//! they are due. A background scheduler thread evaluates every job, pushes
//! the due ones, then sleeps for the smallest registered period (or the
//! configured default while no jobs exist) before evaluating again.
//!
//! A job is *pushed* from the moment its run is enqueued until that run
//! finishes. Pushed jobs are never selected again, which is what limits each
//! job to one concurrent execution.
//!
//! # Example
//!
//! ```rust,ignore
//! use prometheus_jobs::config::JobQueueConfig;
//! use prometheus_jobs::core::{job_callback, JobQueue};
//!
//! let queue = JobQueue::new(JobQueueConfig::default())?;
//! queue.add_job(CacheRefresh::new(), job_callback(|id, running, last| {
//!     tracing::info!(job_id = id, running, ?last, "job transition");
//! }))?;
//! let (pushed, last_run) = queue.fetch_state("cache-refresh");
//! ```

mod container;
pub mod due;

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, info};

use crate::config::JobQueueConfig;
use crate::core::{work_item, SchedulerError, WorkContext, WorkerPool};
use crate::util::{Clock, SystemClock};

use container::JobContainer;

/// Floor for the scheduler sleep so zero-period jobs cannot spin the loop.
pub const MIN_SCHEDULER_INTERVAL: Duration = Duration::from_millis(1);

/// A recurring unit of work.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_jobs::core::{Job, WorkContext};
///
/// struct PruneSessions;
///
/// #[async_trait]
/// impl Job for PruneSessions {
///     fn id(&self) -> &str { "prune-sessions" }
///     async fn run(&self, ctx: &WorkContext) -> anyhow::Result<()> { Ok(()) }
///     fn run_every(&self) -> std::time::Duration { std::time::Duration::from_secs(3600) }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Unique identifier within one queue.
    fn id(&self) -> &str;

    /// Execute one run. Errors are logged and do not affect scheduling.
    async fn run(&self, ctx: &WorkContext) -> anyhow::Result<()>;

    /// Desired interval between runs.
    fn run_every(&self) -> Duration;
}

/// Observer invoked with `(id, is_running, last_run)` before and after each run.
///
/// Before a run `last_run` is the start of the previous run (`None` the
/// first time); after a run it is the start of the run that just ended.
pub type JobCallback = Arc<dyn Fn(&str, bool, Option<DateTime<Local>>) + Send + Sync>;

/// Build a [`JobCallback`] from a closure.
pub fn job_callback<F>(f: F) -> JobCallback
where
    F: Fn(&str, bool, Option<DateTime<Local>>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Callback that ignores every transition.
#[must_use]
pub fn noop_callback() -> JobCallback {
    job_callback(|_, _, _| {})
}

#[derive(Debug, Default)]
struct SchedulerState {
    active: bool,
    epoch: u64,
}

/// Scheduler flag and wakeup. Owned per queue instance.
#[derive(Debug, Default)]
struct SchedulerSignal {
    state: Mutex<SchedulerState>,
    wake: Condvar,
}

impl SchedulerSignal {
    fn owns(&self, epoch: u64) -> bool {
        let state = self.state.lock();
        state.active && state.epoch == epoch
    }

    fn deactivate(&self) {
        self.state.lock().active = false;
        self.wake.notify_all();
    }
}

struct Inner {
    jobs: RwLock<HashMap<String, Arc<JobContainer>>>,
    /// Held shared across every push and exclusively by `clear`, so no run
    /// can reach the queue between `clear` emptying it and returning.
    push_gate: RwLock<()>,
    pool: WorkerPool,
    scheduler: Arc<SchedulerSignal>,
    clock: Arc<dyn Clock>,
    default_interval: Duration,
}

impl Inner {
    /// Enqueue one run of `container` unless it is already pushed or no
    /// longer registered.
    fn push(&self, container: &Arc<JobContainer>) -> bool {
        // A worker callback may push while this thread holds the gate and
        // blocks on a full queue, with `clear` already waiting for it.
        let _gate = self.push_gate.read_recursive();
        if !self.is_registered(container) || !container.try_mark_pushed() {
            return false;
        }
        debug!(job_id = container.id(), "Job pushed");
        let container = Arc::clone(container);
        let clock = Arc::clone(&self.clock);
        self.pool.enqueue_work(work_item(move |ctx| async move {
            if container.is_retired() {
                debug!(parent: &ctx.span, job_id = container.id(), "Skipping run of cleared job");
                return Ok(());
            }
            container.run(ctx, clock).await;
            Ok(())
        }));
        true
    }

    fn is_registered(&self, container: &Arc<JobContainer>) -> bool {
        self.jobs
            .read()
            .get(container.id())
            .is_some_and(|current| Arc::ptr_eq(current, container))
    }

    /// One scheduler pass. Returns the number of jobs pushed and the sleep
    /// until the next pass.
    fn evaluate(&self) -> (usize, Duration) {
        let containers: Vec<Arc<JobContainer>> = self.jobs.read().values().cloned().collect();
        let now = self.clock.now();

        let mut pushed = 0usize;
        let mut interval: Option<Duration> = None;
        for container in &containers {
            let period = container.period();
            interval = Some(interval.map_or(period, |i| i.min(period)));
            if container.should_run(&now) && self.push(container) {
                pushed += 1;
            }
        }

        let sleep = interval
            .unwrap_or(self.default_interval)
            .max(MIN_SCHEDULER_INTERVAL);
        (pushed, sleep)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.scheduler.deactivate();
    }
}

/// Registry of recurring jobs plus the pool and scheduler that run them.
///
/// Cloning is cheap and every clone shares the same jobs, pool and
/// scheduler. The scheduler stops once the last clone is dropped.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Create a queue backed by a freshly started pool.
    ///
    /// The scheduler loop starts with the first [`add_job`](Self::add_job).
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the configuration is invalid
    /// - `SchedulerError::WorkerSpawn` if a worker thread cannot be spawned
    pub fn new(config: JobQueueConfig) -> Result<Self, SchedulerError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`JobQueue::new`] with an explicit time source.
    ///
    /// # Errors
    ///
    /// Same as [`JobQueue::new`].
    pub fn with_clock(config: JobQueueConfig, clock: Arc<dyn Clock>) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let pool = WorkerPool::new(config.pool.clone())?;
        Ok(Self::from_parts(pool, clock, config.default_interval()))
    }

    /// Build a queue around an existing pool.
    #[must_use]
    pub fn from_parts(pool: WorkerPool, clock: Arc<dyn Clock>, default_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: RwLock::new(HashMap::new()),
                push_gate: RwLock::new(()),
                pool,
                scheduler: Arc::new(SchedulerSignal::default()),
                clock,
                default_interval,
            }),
        }
    }

    /// Register `job` and push its first run immediately.
    ///
    /// Starts the pool and the scheduler loop if either is not running.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::DuplicateJob` if the ID is taken; nothing changes
    /// - `SchedulerError::WorkerSpawn` if the pool or scheduler cannot start
    pub fn add_job<J>(&self, job: J, callback: JobCallback) -> Result<(), SchedulerError>
    where
        J: Job,
    {
        let container = {
            let mut jobs = self.inner.jobs.write();
            if jobs.contains_key(job.id()) {
                return Err(SchedulerError::DuplicateJob(job.id().to_string()));
            }
            let container = Arc::new(JobContainer::new(Box::new(job), callback));
            jobs.insert(container.id().to_string(), Arc::clone(&container));
            container
        };

        info!(
            job_id = container.id(),
            run_every_ms = u64::try_from(container.period().as_millis()).unwrap_or(u64::MAX),
            "Job registered"
        );

        self.inner.pool.start()?;
        self.inner.push(&container);
        self.start_scheduler()
    }

    /// Push a run of `id` now, regardless of its schedule.
    ///
    /// Returns `false` if the ID is unknown or a run is already pushed.
    pub fn force_run(&self, id: &str) -> bool {
        let container = self.inner.jobs.read().get(id).cloned();
        match container {
            Some(container) => self.inner.push(&container),
            None => {
                debug!(job_id = id, "Force run of unknown job ignored");
                false
            }
        }
    }

    /// Snapshot of registered job IDs, in no particular order.
    #[must_use]
    pub fn fetch_job_ids(&self) -> Vec<String> {
        self.inner.jobs.read().keys().cloned().collect()
    }

    /// `(is_pushed, last_run_start)` for `id`; `(false, None)` if unknown.
    #[must_use]
    pub fn fetch_state(&self, id: &str) -> (bool, Option<DateTime<Local>>) {
        self.inner
            .jobs
            .read()
            .get(id)
            .map_or((false, None), |c| c.snapshot())
    }

    /// Run one scheduler pass now instead of waiting for the next tick.
    ///
    /// Returns how many jobs were pushed.
    pub fn schedule_due(&self) -> usize {
        self.inner.evaluate().0
    }

    /// Stop the scheduler and the pool and forget every job.
    ///
    /// Queued runs are discarded, and a cleared job's run that a worker
    /// dequeues before stopping is skipped. A run that is already executing
    /// finishes on its own. The next [`add_job`](Self::add_job) starts from
    /// scratch.
    pub fn clear(&self) {
        self.inner.scheduler.deactivate();

        // The pool stays running until the gate is held so a push blocked on
        // a full queue can complete.
        let _gate = self.inner.push_gate.write();
        let removed = {
            let mut jobs = self.inner.jobs.write();
            for container in jobs.values() {
                container.retire();
            }
            let removed = jobs.len();
            jobs.clear();
            removed
        };
        self.inner.pool.stop();
        let discarded = self.inner.pool.discard_queued();
        info!(removed = removed, discarded = discarded, "Job queue cleared");
    }

    /// True while the scheduler loop is running.
    #[must_use]
    pub fn scheduler_active(&self) -> bool {
        self.inner.scheduler.state.lock().active
    }

    /// The pool executing job runs.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    fn start_scheduler(&self) -> Result<(), SchedulerError> {
        let signal = Arc::clone(&self.inner.scheduler);
        let epoch = {
            let mut state = signal.state.lock();
            if state.active {
                // Re-evaluate now so a shorter period takes effect.
                signal.wake.notify_all();
                return Ok(());
            }
            state.active = true;
            state.epoch += 1;
            state.epoch
        };

        let inner = Arc::downgrade(&self.inner);
        let loop_signal = Arc::clone(&signal);
        thread::Builder::new()
            .name("pj-scheduler".into())
            .spawn(move || scheduler_loop(&inner, &loop_signal, epoch))
            .map(|_| ())
            .map_err(|e| {
                let mut state = signal.state.lock();
                if state.epoch == epoch {
                    state.active = false;
                }
                SchedulerError::WorkerSpawn(e.to_string())
            })
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("jobs", &self.inner.jobs.read().len())
            .field("scheduler_active", &self.scheduler_active())
            .field("pool", &self.inner.pool)
            .finish()
    }
}

fn scheduler_loop(inner: &Weak<Inner>, signal: &SchedulerSignal, epoch: u64) {
    debug!(epoch = epoch, "Scheduler loop started");
    loop {
        let sleep = {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            if !signal.owns(epoch) {
                break;
            }
            let (pushed, sleep) = inner.evaluate();
            if pushed > 0 {
                debug!(pushed = pushed, "Scheduler pushed due jobs");
            }
            sleep
        };

        let mut state = signal.state.lock();
        if !(state.active && state.epoch == epoch) {
            break;
        }
        signal.wake.wait_for(&mut state, sleep);
    }
    debug!(epoch = epoch, "Scheduler loop exiting");
}
