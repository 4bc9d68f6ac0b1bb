//! Core type definitions used across the HomeDrive workspace.

pub mod path;

pub use path::{HOME_PATH, TRASH_PATH};
