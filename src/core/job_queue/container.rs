//! Scheduling state wrapped around one registered job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::core::WorkContext;
use crate::util::Clock;

use super::{due, Job, JobCallback};

#[derive(Debug)]
struct RunState {
    period: Duration,
    last_run: Option<DateTime<Local>>,
    is_pushed: bool,
}

pub(crate) struct JobContainer {
    id: String,
    job: Box<dyn Job>,
    callback: JobCallback,
    state: RwLock<RunState>,
    retired: AtomicBool,
}

impl JobContainer {
    pub fn new(job: Box<dyn Job>, callback: JobCallback) -> Self {
        let state = RunState {
            period: job.run_every(),
            last_run: None,
            is_pushed: false,
        };
        Self {
            id: job.id().to_string(),
            job,
            callback,
            state: RwLock::new(state),
            retired: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn period(&self) -> Duration {
        self.state.read().period
    }

    /// `(is_pushed, last_run)`.
    pub fn snapshot(&self) -> (bool, Option<DateTime<Local>>) {
        let state = self.state.read();
        (state.is_pushed, state.last_run)
    }

    pub fn should_run(&self, now: &DateTime<Local>) -> bool {
        let state = self.state.read();
        due::should_run(state.is_pushed, state.last_run.as_ref(), state.period, now)
    }

    /// Mark the job as removed from its queue. Runs still queued are skipped.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Claim the job for one run. Fails if a run is already queued or executing.
    pub fn try_mark_pushed(&self) -> bool {
        let mut state = self.state.write();
        if state.is_pushed {
            return false;
        }
        state.is_pushed = true;
        true
    }

    /// Execute one run: callback, record start, run, callback, release.
    pub async fn run(self: Arc<Self>, ctx: WorkContext, clock: Arc<dyn Clock>) {
        let _pushed = PushedGuard(self.as_ref());

        let previous = self.state.read().last_run;
        (self.callback)(&self.id, true, previous);

        let started = clock.now();
        self.state.write().last_run = Some(started);

        debug!(parent: &ctx.span, job_id = %self.id, "Job started");
        match self.job.run(&ctx).await {
            Ok(()) => debug!(parent: &ctx.span, job_id = %self.id, "Job finished"),
            Err(e) => warn!(parent: &ctx.span, job_id = %self.id, error = %e, "Job failed"),
        }

        (self.callback)(&self.id, false, Some(started));
    }
}

/// Clears `is_pushed` when the run ends, even by unwinding.
struct PushedGuard<'a>(&'a JobContainer);

impl Drop for PushedGuard<'_> {
    fn drop(&mut self) {
        self.0.state.write().is_pushed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job_queue::{job_callback, noop_callback};
    use crate::util::ManualClock;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio_util::sync::CancellationToken;

    struct Failing;

    #[async_trait]
    impl Job for Failing {
        fn id(&self) -> &str {
            "failing"
        }

        async fn run(&self, _ctx: &WorkContext) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }

        fn run_every(&self) -> Duration {
            Duration::from_secs(30)
        }
    }

    #[tokio::test]
    async fn test_run_records_state_and_callbacks() {
        let calls: Arc<Mutex<Vec<(bool, Option<DateTime<Local>>)>>> = Arc::default();
        let recorded = Arc::clone(&calls);
        let callback = job_callback(move |id, running, last| {
            assert_eq!(id, "failing");
            recorded.lock().push((running, last));
        });

        let start = Local::now();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(start));
        let container = Arc::new(JobContainer::new(Box::new(Failing), callback));

        assert!(container.try_mark_pushed());
        assert!(!container.try_mark_pushed());

        let ctx = WorkContext::detached(CancellationToken::new());
        Arc::clone(&container).run(ctx, clock).await;

        let (pushed, last) = container.snapshot();
        assert!(!pushed);
        assert_eq!(last, Some(start));
        assert_eq!(*calls.lock(), vec![(true, None), (false, Some(start))]);
    }

    #[test]
    fn test_period_comes_from_job() {
        let container = JobContainer::new(Box::new(Failing), noop_callback());
        assert_eq!(container.id(), "failing");
        assert_eq!(container.period(), Duration::from_secs(30));
        assert!(container.should_run(&Local::now()));
        assert!(!container.is_retired());
        container.retire();
        assert!(container.is_retired());
    }
}
