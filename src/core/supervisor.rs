//! Supervision of worker loop launches.
//!
//! Worker loops do not contain panics raised by work items. Each launch is
//! wrapped by [`supervise`], which catches the unwind and forwards it to a
//! [`Supervisor`] (an error/telemetry sink such as Sentry), after which the
//! worker is left inactive until the pool is started again.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

/// Sink for failures of supervised worker loops.
pub trait Supervisor: Send + Sync + 'static {
    /// Called once when a supervised loop unwinds.
    fn report_panic(&self, worker_id: usize, message: &str);
}

/// Default supervisor that logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSupervisor;

impl Supervisor for TracingSupervisor {
    fn report_panic(&self, worker_id: usize, message: &str) {
        error!(worker_id = worker_id, panic = message, "Worker loop panicked");
    }
}

/// Run `body`, reporting a panic to `supervisor` instead of unwinding further.
///
/// Returns `true` when the body returned normally.
pub fn supervise<F>(supervisor: &dyn Supervisor, worker_id: usize, body: F) -> bool
where
    F: FnOnce(),
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => true,
        Err(payload) => {
            supervisor.report_panic(worker_id, &panic_message(payload.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
