//! Configuration models for pools and queues.

pub mod pool;

pub use pool::{
    EventQueueConfig, JobQueueConfig, SubstrateConfig, TopicConfig, WorkerPoolConfig, ENV_PREFIX,
};
