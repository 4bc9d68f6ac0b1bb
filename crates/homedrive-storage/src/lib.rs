//! # homedrive-storage
//!
//! Blob backends holding the physical bytes of file content. The
//! folder-hierarchy engine talks to them only through
//! [`homedrive_core::traits::BlobStore`].

pub mod manager;
pub mod providers;

pub use manager::StorageManager;
