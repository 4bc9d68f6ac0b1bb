//! Folder tree mutation and cascading delete.

pub mod cascade;
pub mod service;
mod tree;

pub use cascade::{CascadeOrchestrator, HardDeleteReport};
pub use service::FolderService;
