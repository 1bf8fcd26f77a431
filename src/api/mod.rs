//! Serializable views for status endpoints built on the core.

pub mod status;

pub use status::{health, job_statuses, Health, JobStatus, PoolStatus};
