//! # homedrive-database
//!
//! The durable, transactional record store behind the folder-hierarchy
//! engine. [`DriveStore`] opens units of work; the PostgreSQL
//! implementation backs production and [`MemoryStore`] provides the same
//! transactional guarantees in-process.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use postgres::PgDriveStore;
pub use store::{DriveStore, StoreTransaction};
