//! Core traits defined in `homedrive-core` and implemented by other crates.

pub mod storage;

pub use storage::{BlobHandle, BlobStore};
