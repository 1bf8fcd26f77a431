//! Integration tests for partitioned Topic broadcast

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use prometheus_jobs::config::{TopicConfig, WorkerPoolConfig};
use prometheus_jobs::core::{Subscriber, Topic};

/// Subscriber counting deliveries and remembering the worker thread name
struct Connection {
    id: String,
    received: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

impl Connection {
    fn new(id: usize) -> Arc<Self> {
        Arc::new(Self {
            id: format!("conn-{id}"),
            received: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        })
    }
}

impl Subscriber<String> for Connection {
    fn id(&self) -> &str {
        &self.id
    }

    fn on_event(&self, event: &String) {
        self.received.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().push(event.clone());
    }
}

fn topic(partition_size: usize) -> Topic<String> {
    let pool = WorkerPoolConfig::new()
        .with_worker_count(3)
        .with_max_queue_depth(32)
        .with_idle_poll(Duration::from_millis(10))
        .with_drain_poll(Duration::from_millis(5));
    Topic::new(
        "market-data",
        TopicConfig {
            pool,
            partition_size,
        },
    )
    .expect("Failed to create topic")
}

#[test]
fn test_broadcast_partitions_subscribers() {
    let topic = topic(3);
    let connections: Vec<_> = (0..10).map(Connection::new).collect();
    for connection in &connections {
        topic.subscribe(connection);
    }

    assert_eq!(topic.broadcast("tick".to_string()), 4);
    assert!(topic.pool().wait_until_done_timeout(Duration::from_secs(2)));

    assert!(connections
        .iter()
        .all(|c| c.received.load(Ordering::SeqCst) == 1));
    assert_eq!(topic.pool().stats().completed_tasks, 4);
    assert_eq!(topic.name(), "market-data");
}

#[test]
fn test_broadcast_order_per_subscriber() {
    let topic = topic(2);
    let connections: Vec<_> = (0..4).map(Connection::new).collect();
    for connection in &connections {
        topic.subscribe(connection);
    }

    for i in 0..5 {
        topic.broadcast(format!("msg-{i}"));
        // Wait per message so cross-partition items cannot reorder.
        assert!(topic.pool().wait_until_done_timeout(Duration::from_secs(2)));
    }

    let expected: Vec<String> = (0..5).map(|i| format!("msg-{i}")).collect();
    for connection in &connections {
        assert_eq!(*connection.messages.lock(), expected);
    }
}

#[test]
fn test_unsubscribe_and_empty_broadcast() {
    let topic = topic(8);
    let only = Connection::new(0);
    topic.subscribe(&only);
    assert!(topic.unsubscribe("conn-0"));
    assert!(!topic.unsubscribe("conn-0"));
    assert_eq!(topic.subscriber_count(), 0);
    assert_eq!(topic.broadcast("nobody".to_string()), 0);
    assert_eq!(only.received.load(Ordering::SeqCst), 0);
}
