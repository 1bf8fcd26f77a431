//! Pool and queue configuration structures.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix for environment overrides read by [`SubstrateConfig::from_env`].
pub const ENV_PREFIX: &str = "PROMETHEUS_JOBS_";

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Capacity of the shared bounded queue.
    pub max_queue_depth: usize,
    /// Stack size for each worker thread, in bytes.
    pub thread_stack_size: usize,
    /// How long an idle worker waits on the queue before re-checking its
    /// active flag, in milliseconds.
    pub idle_poll_ms: u64,
    /// Polling interval used by `wait_until_done`, in milliseconds.
    pub drain_poll_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            max_queue_depth: 100,
            thread_stack_size: 2 * 1024 * 1024,
            idle_poll_ms: 50,
            drain_poll_ms: 10,
        }
    }
}

impl WorkerPoolConfig {
    /// Defaults: one worker per CPU, queue depth 100.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the idle poll interval.
    #[must_use]
    pub const fn with_idle_poll(mut self, interval: Duration) -> Self {
        self.idle_poll_ms = duration_ms(interval);
        self
    }

    /// Set the `wait_until_done` poll interval.
    #[must_use]
    pub const fn with_drain_poll(mut self, interval: Duration) -> Self {
        self.drain_poll_ms = duration_ms(interval);
        self
    }

    /// Idle poll interval as a `Duration`.
    #[must_use]
    pub const fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    /// Drain poll interval as a `Duration`.
    #[must_use]
    pub const fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        if self.idle_poll_ms == 0 {
            return Err("idle_poll_ms must be greater than 0".into());
        }
        if self.drain_poll_ms == 0 {
            return Err("drain_poll_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Job queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQueueConfig {
    /// Pool that executes job runs.
    pub pool: WorkerPoolConfig,
    /// Scheduler interval used while no jobs are registered, in seconds.
    pub default_interval_secs: u64,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            pool: WorkerPoolConfig::default(),
            default_interval_secs: 10,
        }
    }
}

impl JobQueueConfig {
    /// Job queue running on the given pool configuration.
    #[must_use]
    pub fn with_pool(pool: WorkerPoolConfig) -> Self {
        Self {
            pool,
            ..Self::default()
        }
    }

    /// Scheduler interval used while no jobs are registered.
    #[must_use]
    pub const fn default_interval(&self) -> Duration {
        Duration::from_secs(self.default_interval_secs)
    }

    /// Validate job queue configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate()?;
        if self.default_interval_secs == 0 {
            return Err("default_interval_secs must be greater than 0".into());
        }
        Ok(())
    }
}

/// Event queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQueueConfig {
    /// Pool that runs fan-out work items.
    pub pool: WorkerPoolConfig,
}

impl EventQueueConfig {
    /// Validate event queue configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate()
    }
}

/// Partitioned topic configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Pool that runs partition deliveries.
    pub pool: WorkerPoolConfig,
    /// Maximum subscribers delivered to by one work item.
    pub partition_size: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            pool: WorkerPoolConfig::default(),
            partition_size: 64,
        }
    }
}

impl TopicConfig {
    /// Validate topic configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate()?;
        if self.partition_size == 0 {
            return Err("partition_size must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration grouping every queue the substrate can build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateConfig {
    /// Recurring job queue.
    pub jobs: JobQueueConfig,
    /// Event fan-out queue.
    pub events: EventQueueConfig,
    /// Partitioned topic broadcaster.
    pub topics: TopicConfig,
}

impl SubstrateConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.jobs.validate().map_err(|e| format!("jobs invalid: {e}"))?;
        self.events
            .validate()
            .map_err(|e| format!("events invalid: {e}"))?;
        self.topics
            .validate()
            .map_err(|e| format!("topics invalid: {e}"))?;
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `PROMETHEUS_JOBS_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`, keyed by full variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        override_from(&lookup, "JOB_WORKERS", &mut cfg.jobs.pool.worker_count)?;
        override_from(&lookup, "JOB_QUEUE_DEPTH", &mut cfg.jobs.pool.max_queue_depth)?;
        override_from(
            &lookup,
            "SCHEDULER_INTERVAL_SECS",
            &mut cfg.jobs.default_interval_secs,
        )?;
        override_from(&lookup, "EVENT_WORKERS", &mut cfg.events.pool.worker_count)?;
        override_from(
            &lookup,
            "EVENT_QUEUE_DEPTH",
            &mut cfg.events.pool.max_queue_depth,
        )?;
        override_from(&lookup, "TOPIC_WORKERS", &mut cfg.topics.pool.worker_count)?;
        override_from(
            &lookup,
            "TOPIC_QUEUE_DEPTH",
            &mut cfg.topics.pool.max_queue_depth,
        )?;
        override_from(
            &lookup,
            "TOPIC_PARTITION_SIZE",
            &mut cfg.topics.partition_size,
        )?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}{key}");
    if let Some(raw) = lookup(&name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| format!("{name}: cannot parse `{raw}`: {e}"))?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}
