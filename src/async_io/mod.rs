//! Async submission loading utilities
//! Reads submission envelopes concurrently with tokio

pub mod file_ops;
pub mod loader;

pub use file_ops::find_instance_files_async;
pub use loader::load_instances_async;
