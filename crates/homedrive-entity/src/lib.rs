//! # homedrive-entity
//!
//! Domain entity models for HomeDrive. Every struct in this crate
//! represents a record-store row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and store rows
//! additionally derive `sqlx::FromRow`.

pub mod bookmark;
pub mod drive;
pub mod file;
pub mod folder;
pub mod node;
