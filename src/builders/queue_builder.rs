//! Build every queue described by a [`SubstrateConfig`].

use crate::config::SubstrateConfig;
use crate::core::{EventQueue, JobQueue, SchedulerError, Topic};

/// The job queue, event queue and topic built from one configuration.
#[derive(Debug)]
pub struct Substrate<E> {
    /// Recurring jobs.
    pub jobs: JobQueue,
    /// Ordered event fan-out.
    pub events: EventQueue<E>,
    /// Partitioned broadcast.
    pub topic: Topic<E>,
}

/// Validate `cfg` and build each queue on its own pool.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidConfig` if validation fails and
/// `SchedulerError::WorkerSpawn` if any pool cannot start.
pub fn build_substrate<E>(
    cfg: &SubstrateConfig,
    topic_name: &str,
) -> Result<Substrate<E>, SchedulerError>
where
    E: Send + Sync + 'static,
{
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;

    Ok(Substrate {
        jobs: JobQueue::new(cfg.jobs.clone())?,
        events: EventQueue::new(cfg.events.clone())?,
        topic: Topic::new(topic_name, cfg.topics.clone())?,
    })
}
