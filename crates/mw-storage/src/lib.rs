//! Artifact storage for the media worker.
//!
//! Provides the [`ArtifactStore`] trait with an S3-compatible backend
//! (MinIO, R2, AWS) and a local filesystem backend.

pub mod client;
pub mod error;
pub mod fs_store;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use fs_store::LocalStore;
pub use store::{content_type_for, public_url, validate_key, ArtifactStore};
