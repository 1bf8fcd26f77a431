//! # Prometheus Jobs
//!
//! An in-process concurrent task-execution substrate: a fixed-size worker
//! pool, a recurring-job scheduler built on it, and subscriber fan-out built
//! on it as well.
//!
//! HTTP handlers, WebSocket topics and background maintenance tasks all
//! submit work the same way, without each re-implementing pool lifecycle,
//! backpressure or scheduling.
//!
//! ## Components
//!
//! - **`WorkerPool`**: fixed set of OS-thread workers draining one bounded FIFO queue
//! - **`JobQueue`**: named recurring jobs, at most one run in flight per job
//! - **`EventQueue`**: ordered fan-out of each event to every subscriber
//! - **`Topic`**: partitioned fan-out for large subscriber sets
//!
//! ## WorkerPool
//!
//! ```rust,ignore
//! use prometheus_jobs::config::WorkerPoolConfig;
//! use prometheus_jobs::core::{work_item, WorkerPool};
//!
//! let pool = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(4))?;
//! pool.enqueue_work(work_item(|ctx| async move {
//!     tracing::info!(parent: &ctx.span, "hello from a worker");
//!     Ok(())
//! }));
//! pool.wait_until_done();
//! ```
//!
//! ## JobQueue
//!
//! ```rust,ignore
//! use prometheus_jobs::config::JobQueueConfig;
//! use prometheus_jobs::core::{noop_callback, JobQueue};
//!
//! let jobs = JobQueue::new(JobQueueConfig::default())?;
//! jobs.add_job(PruneSessions, noop_callback())?;
//! jobs.force_run("prune-sessions");
//! ```
//!
//! Scheduling is single-process and in-memory. Job definitions do not
//! survive a restart.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Worker pool, job scheduler, and event fan-out.
pub mod core;
/// Configuration models for pools and queues.
pub mod config;
/// Builders to construct queues from configuration.
pub mod builders;
/// Serializable status views.
pub mod api;
/// Shared utilities.
pub mod util;
