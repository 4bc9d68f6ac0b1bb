//! Path resolution.

pub mod resolver;

pub use resolver::{ParentContext, PathResolver};
