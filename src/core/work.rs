//! Work items and the context handed to them.
//!
//! A [`WorkItem`] is an opaque, one-shot unit of async work. It has no
//! identity; whichever worker dequeues it takes ownership and drives it to
//! completion on that worker's runtime.
//!
//! ```rust,ignore
//! use prometheus_jobs::core::work_item;
//!
//! pool.enqueue_work(work_item(|ctx| async move {
//!     tracing::debug!(parent: &ctx.span, "refreshing cache");
//!     Ok(())
//! }));
//! ```

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use super::AppResult;

/// Execution context passed into every work item and job run.
#[derive(Debug, Clone)]
pub struct WorkContext {
    /// Cancellation signal. The pool only cancels it when dropped; bodies
    /// that want to honor it must check it themselves.
    pub cancel: CancellationToken,
    /// Index of the worker executing this item.
    pub worker_id: usize,
    /// Structured logger for the item. Events recorded with
    /// `parent: &ctx.span` carry the worker's fields.
    pub span: Span,
}

impl WorkContext {
    /// Build a context outside of a pool, e.g. for driving a job body by hand.
    #[must_use]
    pub fn detached(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            worker_id: 0,
            span: Span::none(),
        }
    }

    /// True once the surrounding pool has been torn down.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// A boxed, one-shot unit of work.
pub type WorkItem = Box<dyn FnOnce(WorkContext) -> BoxFuture<'static, AppResult<()>> + Send>;

/// Wrap an async closure into a [`WorkItem`].
pub fn work_item<F, Fut>(f: F) -> WorkItem
where
    F: FnOnce(WorkContext) -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Box::new(move |ctx| f(ctx).boxed())
}
