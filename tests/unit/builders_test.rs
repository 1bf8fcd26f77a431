//! Tests for builder modules

use prometheus_jobs::builders::build_substrate;
use prometheus_jobs::config::{SubstrateConfig, WorkerPoolConfig};
use prometheus_jobs::core::SchedulerError;

fn small_pool() -> WorkerPoolConfig {
    WorkerPoolConfig::new()
        .with_worker_count(1)
        .with_max_queue_depth(4)
}

#[test]
fn test_build_substrate_uses_each_section() {
    let mut cfg = SubstrateConfig::default();
    cfg.jobs.pool = small_pool();
    cfg.events.pool = small_pool().with_worker_count(2);
    cfg.topics.pool = small_pool().with_worker_count(3);

    let substrate = build_substrate::<String>(&cfg, "alerts").expect("Failed to build");
    assert_eq!(substrate.jobs.pool().worker_count(), 1);
    assert_eq!(substrate.events.pool().worker_count(), 2);
    assert_eq!(substrate.topic.pool().worker_count(), 3);
    assert_eq!(substrate.topic.name(), "alerts");
    assert!(substrate.jobs.fetch_job_ids().is_empty());
}

#[test]
fn test_build_substrate_rejects_invalid_config() {
    let mut cfg = SubstrateConfig::default();
    cfg.topics.partition_size = 0;
    let err = build_substrate::<u8>(&cfg, "t").unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(msg) if msg.contains("partition_size")));
}
