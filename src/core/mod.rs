//! Core concurrency primitives: worker pool, job scheduler, and fan-out.

pub mod error;
pub mod event_queue;
pub mod job_queue;
pub mod supervisor;
pub mod topic;
pub mod work;
pub mod worker_pool;

pub use error::{AppResult, SchedulerError};
pub use event_queue::{EventQueue, Subscriber};
pub use job_queue::{job_callback, noop_callback, Job, JobCallback, JobQueue};
pub use supervisor::{supervise, Supervisor, TracingSupervisor};
pub use topic::Topic;
pub use work::{work_item, WorkContext, WorkItem};
pub use worker_pool::{PoolStats, WorkerPool};
