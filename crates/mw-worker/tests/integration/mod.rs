//! Pipeline and worker loop tests driven by in-memory collaborators.

pub mod media_tests;
pub mod pipeline_tests;
pub mod support;
pub mod worker_loop_tests;
