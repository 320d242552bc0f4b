//! Redis job queue and status store.
//!
//! This crate provides:
//! - The [`JobSource`] and [`ResultSink`] collaborator traits
//! - A Redis list queue (BLPOP consumer, RPUSH producer)
//! - Status records in `task:{id}` hashes

pub mod error;
pub mod queue;
pub mod source;
pub mod status;

pub use error::{QueueError, QueueResult};
pub use queue::{QueueConfig, RedisJobQueue};
pub use source::{decode_job, JobSource, ResultSink};
pub use status::{status_key, RedisStatusSink};
