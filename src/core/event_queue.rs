//! Subscriber fan-out on top of a [`WorkerPool`].
//!
//! Each event becomes exactly one work item. When that item runs it takes a
//! read lock over the subscriber list and notifies every live subscriber in
//! registration order, so for a single event all subscribers are notified
//! by the same worker, one after another. Two events are only ordered
//! relative to each other by the pool's FIFO queue.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::config::EventQueueConfig;
use crate::core::{work_item, SchedulerError, WorkerPool};

/// Receiver of events.
pub trait Subscriber<E>: Send + Sync {
    /// Identity used for removal.
    fn id(&self) -> &str;

    /// Handle one event. Runs on a pool worker.
    fn on_event(&self, event: &E);
}

/// Weak handle on a subscriber plus its cached ID.
pub(crate) struct SubscriberEntry<E> {
    pub id: String,
    pub subscriber: Weak<dyn Subscriber<E>>,
}

impl<E> SubscriberEntry<E> {
    pub fn new<S>(subscriber: &Arc<S>) -> Self
    where
        S: Subscriber<E> + 'static,
    {
        let strong: Arc<dyn Subscriber<E>> = Arc::clone(subscriber) as Arc<dyn Subscriber<E>>;
        Self {
            id: strong.id().to_string(),
            subscriber: Arc::downgrade(&strong),
        }
    }

    pub fn is_live(&self) -> bool {
        self.subscriber.strong_count() > 0
    }
}

impl<E> Clone for SubscriberEntry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            subscriber: Weak::clone(&self.subscriber),
        }
    }
}

/// Notify each live entry in order.
pub(crate) fn deliver<E>(entries: &[SubscriberEntry<E>], event: &E) -> usize {
    let mut delivered = 0usize;
    for entry in entries {
        if let Some(subscriber) = entry.subscriber.upgrade() {
            subscriber.on_event(event);
            delivered += 1;
        }
    }
    delivered
}

/// Ordered set of subscribers sharing one pool for delivery.
///
/// Subscribers are held weakly. Their owner keeps them alive and is expected
/// to unregister them; dropped subscribers are skipped during delivery and
/// pruned on the next add or remove.
pub struct EventQueue<E> {
    pool: WorkerPool,
    subscribers: Arc<RwLock<Vec<SubscriberEntry<E>>>>,
}

impl<E> EventQueue<E>
where
    E: Send + Sync + 'static,
{
    /// Create an event queue with its own pool.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` for an invalid pool
    /// configuration and `SchedulerError::WorkerSpawn` if workers cannot start.
    pub fn new(config: EventQueueConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self::with_pool(WorkerPool::new(config.pool)?))
    }

    /// Build an event queue around an existing pool.
    #[must_use]
    pub fn with_pool(pool: WorkerPool) -> Self {
        Self {
            pool,
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append `subscriber` to the delivery order.
    pub fn add_subscriber<S>(&self, subscriber: &Arc<S>)
    where
        S: Subscriber<E> + 'static,
    {
        let entry = SubscriberEntry::<E>::new(subscriber);
        debug!(subscriber_id = %entry.id, "Subscriber added");
        let mut subscribers = self.subscribers.write();
        subscribers.retain(SubscriberEntry::is_live);
        subscribers.push(entry);
    }

    /// Remove every subscriber registered under `id`.
    ///
    /// Unknown IDs are a no-op. Returns `true` if anything was removed.
    pub fn remove_subscriber(&self, id: &str) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|entry| entry.id != id);
        let removed = subscribers.len() < before;
        subscribers.retain(SubscriberEntry::is_live);
        if removed {
            debug!(subscriber_id = id, "Subscriber removed");
        }
        removed
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().iter().filter(|e| e.is_live()).count()
    }

    /// IDs of live subscribers in delivery order.
    #[must_use]
    pub fn subscriber_ids(&self) -> Vec<String> {
        self.subscribers
            .read()
            .iter()
            .filter(|e| e.is_live())
            .map(|e| e.id.clone())
            .collect()
    }

    /// Submit one work item that delivers `event` to every subscriber.
    ///
    /// Blocks while the pool's queue is full.
    pub fn enqueue_event(&self, event: E) {
        let subscribers = Arc::clone(&self.subscribers);
        self.pool.enqueue_work(work_item(move |ctx| async move {
            let delivered = deliver(&subscribers.read(), &event);
            debug!(parent: &ctx.span, delivered = delivered, "Event delivered");
            Ok(())
        }));
    }

    /// The pool delivering events.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

impl<E> std::fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("subscribers", &self.subscribers.read().len())
            .field("pool", &self.pool)
            .finish()
    }
}
