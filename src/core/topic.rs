//! Partitioned broadcast for topics with many subscribers.
//!
//! Unlike [`EventQueue`](crate::core::EventQueue), a broadcast is split into
//! one work item per partition of at most `partition_size` subscribers, so
//! large subscriber sets are delivered to by several workers at once. Order
//! holds within a partition only.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::TopicConfig;
use crate::core::event_queue::{deliver, SubscriberEntry};
use crate::core::{work_item, SchedulerError, Subscriber, WorkerPool};

/// Named subscriber set with partitioned delivery.
pub struct Topic<E> {
    name: String,
    partition_size: usize,
    pool: WorkerPool,
    subscribers: RwLock<Vec<SubscriberEntry<E>>>,
}

impl<E> Topic<E>
where
    E: Send + Sync + 'static,
{
    /// Create a topic with its own pool.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` for an invalid configuration
    /// and `SchedulerError::WorkerSpawn` if workers cannot start.
    pub fn new(name: impl Into<String>, config: TopicConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let pool = WorkerPool::new(config.pool)?;
        Ok(Self {
            name: name.into(),
            partition_size: config.partition_size,
            pool,
            subscribers: RwLock::new(Vec::new()),
        })
    }

    /// Topic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append `subscriber`.
    pub fn subscribe<S>(&self, subscriber: &Arc<S>)
    where
        S: Subscriber<E> + 'static,
    {
        let entry = SubscriberEntry::<E>::new(subscriber);
        debug!(topic = %self.name, subscriber_id = %entry.id, "Topic subscriber added");
        let mut subscribers = self.subscribers.write();
        subscribers.retain(SubscriberEntry::is_live);
        subscribers.push(entry);
    }

    /// Remove every subscriber registered under `id`. Unknown IDs are a no-op.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|entry| entry.id != id);
        let removed = subscribers.len() < before;
        subscribers.retain(SubscriberEntry::is_live);
        removed
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().iter().filter(|e| e.is_live()).count()
    }

    /// Deliver `event` to a snapshot of the current subscribers.
    ///
    /// Returns the number of work items submitted.
    pub fn broadcast(&self, event: E) -> usize {
        let live: Vec<SubscriberEntry<E>> = self
            .subscribers
            .read()
            .iter()
            .filter(|e| e.is_live())
            .cloned()
            .collect();
        let partitions: Vec<Vec<SubscriberEntry<E>>> = live
            .chunks(self.partition_size)
            .map(<[SubscriberEntry<E>]>::to_vec)
            .collect();

        let event = Arc::new(event);
        let count = partitions.len();
        for (index, partition) in partitions.into_iter().enumerate() {
            let event = Arc::clone(&event);
            let topic = self.name.clone();
            self.pool.enqueue_work(work_item(move |ctx| async move {
                let delivered = deliver(&partition, event.as_ref());
                debug!(
                    parent: &ctx.span,
                    topic = %topic,
                    partition = index,
                    delivered = delivered,
                    "Topic partition delivered"
                );
                Ok(())
            }));
        }
        count
    }

    /// The pool delivering partitions.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl<E> std::fmt::Debug for Topic<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("partition_size", &self.partition_size)
            .field("subscribers", &self.subscribers.read().len())
            .finish_non_exhaustive()
    }
}
