//! # homedrive-core
//!
//! Core crate for HomeDrive. Contains the error taxonomy, configuration
//! schemas, the materialized-path algebra, and the
//! [`BlobStore`](traits::BlobStore) trait implemented by byte backends.
//!
//! This crate has **no** internal dependencies on other HomeDrive crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
