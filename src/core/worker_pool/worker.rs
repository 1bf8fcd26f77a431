//! A single worker: one OS thread draining the pool's shared queue.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::core::{supervise, SchedulerError, WorkContext, WorkItem};

use super::{InFlight, PoolShared};

/// Activity flag plus the epoch of the loop that currently owns the worker.
///
/// Every launch bumps the epoch. A loop keeps running only while the flag is
/// set and the epoch is still its own, so after a restart the old loop
/// exits at its next dequeue boundary.
#[derive(Debug, Default)]
struct WorkerState {
    active: bool,
    epoch: u64,
}

pub(crate) struct Worker {
    id: usize,
    shared: Arc<PoolShared>,
    state: Arc<Mutex<WorkerState>>,
}

impl Worker {
    /// An inactive worker bound to the pool's shared state.
    pub fn new(id: usize, shared: Arc<PoolShared>) -> Self {
        Self {
            id,
            shared,
            state: Arc::new(Mutex::new(WorkerState::default())),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Launch the run loop unless it is already active.
    ///
    /// After a `stop` followed quickly by `start`, the previous loop may still
    /// be waiting in `recv_timeout` and can claim one more item before it sees
    /// the new epoch. For up to one idle poll this worker slot has two loops
    /// taking items.
    ///
    /// Returns `Ok(true)` when a new loop was spawned.
    pub fn start(&self) -> Result<bool, SchedulerError> {
        let epoch = {
            let mut state = self.state.lock();
            if state.active {
                return Ok(false);
            }
            state.active = true;
            state.epoch += 1;
            state.epoch
        };

        let id = self.id;
        let shared = Arc::clone(&self.shared);
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name(format!("pj-worker-{id}"))
            .stack_size(self.shared.config.thread_stack_size)
            .spawn(move || {
                let finished = supervise(shared.supervisor.as_ref(), id, || {
                    run_loop(id, &shared, &state, epoch);
                });
                if !finished {
                    relinquish(&state, epoch);
                }
            });

        match spawned {
            Ok(_) => Ok(true),
            Err(e) => {
                relinquish(&self.state, epoch);
                Err(SchedulerError::WorkerSpawn(e.to_string()))
            }
        }
    }

    /// Clear the active flag. The loop exits at its next dequeue boundary.
    pub fn stop(&self) {
        self.state.lock().active = false;
    }
}

fn owns(state: &Mutex<WorkerState>, epoch: u64) -> bool {
    let state = state.lock();
    state.active && state.epoch == epoch
}

fn relinquish(state: &Mutex<WorkerState>, epoch: u64) {
    let mut state = state.lock();
    if state.epoch == epoch {
        state.active = false;
    }
}

fn run_loop(id: usize, shared: &PoolShared, state: &Mutex<WorkerState>, epoch: u64) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(worker_id = id, error = %e, "Failed to create worker runtime");
            relinquish(state, epoch);
            return;
        }
    };

    debug!(worker_id = id, epoch = epoch, "Worker loop started");

    let idle_poll = shared.config.idle_poll();
    while owns(state, epoch) {
        let item = match shared.queue.recv_timeout(idle_poll) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!(worker_id = id, "Worker queue closed, exiting");
                relinquish(state, epoch);
                break;
            }
        };
        execute(id, shared, &rt, item);
    }

    debug!(worker_id = id, epoch = epoch, "Worker loop exiting");
}

fn execute(id: usize, shared: &PoolShared, rt: &tokio::runtime::Runtime, item: WorkItem) {
    let _in_flight = InFlight::enter(&shared.counters);

    let span = info_span!("work_item", worker_id = id);
    let ctx = WorkContext {
        cancel: shared.cancel.child_token(),
        worker_id: id,
        span: span.clone(),
    };

    debug!(parent: &span, "Work item started");
    let result = rt.block_on(item(ctx).instrument(span.clone()));

    match result {
        Ok(()) => {
            shared.counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
            debug!(parent: &span, "Work item finished");
        }
        Err(e) => {
            shared.counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
            warn!(parent: &span, error = %e, "Work item failed");
        }
    }
}
