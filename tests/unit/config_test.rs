//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use prometheus_jobs::config::{
    JobQueueConfig, SubstrateConfig, TopicConfig, WorkerPoolConfig, ENV_PREFIX,
};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_pool_config_defaults_are_valid() {
    let cfg = WorkerPoolConfig::default();
    assert!(cfg.validate().is_ok());
    assert!(cfg.worker_count >= 1);
    assert_eq!(cfg.max_queue_depth, 100);
}

#[test]
fn test_pool_config_invalid_worker_count() {
    let cfg = WorkerPoolConfig::new().with_worker_count(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_pool_config_invalid_queue_depth() {
    let cfg = WorkerPoolConfig::new().with_max_queue_depth(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_pool_config_invalid_stack_size() {
    let cfg = WorkerPoolConfig::new().with_thread_stack_size(1024);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("thread_stack_size"));
}

#[test]
fn test_pool_config_poll_intervals() {
    let cfg = WorkerPoolConfig::new()
        .with_idle_poll(Duration::from_millis(25))
        .with_drain_poll(Duration::from_millis(3));
    assert_eq!(cfg.idle_poll(), Duration::from_millis(25));
    assert_eq!(cfg.drain_poll(), Duration::from_millis(3));

    let zero = WorkerPoolConfig::new().with_idle_poll(Duration::ZERO);
    assert!(zero.validate().is_err());
}

#[test]
fn test_job_queue_config_invalid_interval() {
    let cfg = JobQueueConfig {
        default_interval_secs: 0,
        ..JobQueueConfig::default()
    };
    assert!(cfg.validate().is_err());
    assert_eq!(
        JobQueueConfig::default().default_interval(),
        Duration::from_secs(10)
    );
}

#[test]
fn test_topic_config_invalid_partition_size() {
    let cfg = TopicConfig {
        partition_size: 0,
        ..TopicConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_substrate_config_reports_section() {
    let mut cfg = SubstrateConfig::default();
    cfg.events.pool.worker_count = 0;
    let err = cfg.validate().unwrap_err();
    assert!(err.starts_with("events invalid"));
}

#[test]
fn test_substrate_config_from_json() {
    let json = r#"{
        "jobs": { "pool": { "worker_count": 2 }, "default_interval_secs": 30 },
        "topics": { "partition_size": 16 }
    }"#;
    let cfg = SubstrateConfig::from_json_str(json).expect("valid config");
    assert_eq!(cfg.jobs.pool.worker_count, 2);
    assert_eq!(cfg.jobs.pool.max_queue_depth, 100);
    assert_eq!(cfg.jobs.default_interval_secs, 30);
    assert_eq!(cfg.topics.partition_size, 16);
    assert_eq!(cfg.events, SubstrateConfig::default().events);
}

#[test]
fn test_substrate_config_from_json_rejects_invalid() {
    let err = SubstrateConfig::from_json_str(r#"{ "jobs": { "pool": { "worker_count": 0 } } }"#)
        .unwrap_err();
    assert!(err.starts_with("jobs invalid"));

    let err = SubstrateConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_substrate_config_from_lookup_overrides() {
    let cfg = SubstrateConfig::from_lookup(lookup_from(&[
        ("JOB_WORKERS", "3"),
        ("SCHEDULER_INTERVAL_SECS", " 5 "),
        ("EVENT_QUEUE_DEPTH", "7"),
        ("TOPIC_PARTITION_SIZE", "12"),
    ]))
    .expect("valid overrides");

    assert_eq!(cfg.jobs.pool.worker_count, 3);
    assert_eq!(cfg.jobs.default_interval_secs, 5);
    assert_eq!(cfg.events.pool.max_queue_depth, 7);
    assert_eq!(cfg.topics.partition_size, 12);
    assert_eq!(cfg.topics.pool, WorkerPoolConfig::default());
}

#[test]
fn test_substrate_config_from_lookup_parse_error() {
    let err = SubstrateConfig::from_lookup(lookup_from(&[("TOPIC_WORKERS", "many")]))
        .unwrap_err();
    assert!(err.contains("PROMETHEUS_JOBS_TOPIC_WORKERS"));
    assert!(err.contains("many"));
}

#[test]
fn test_substrate_config_from_lookup_validates() {
    let err = SubstrateConfig::from_lookup(lookup_from(&[("JOB_QUEUE_DEPTH", "0")]))
        .unwrap_err();
    assert!(err.contains("max_queue_depth"));
}
