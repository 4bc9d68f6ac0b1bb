//! # homedrive-service
//!
//! The folder-hierarchy engine. Services resolve paths, mutate the tree,
//! run cascading deletes, and keep drive quota consistent, each operation
//! inside units of work opened on a [`homedrive_database::DriveStore`].
//!
//! Services follow constructor injection; [`DriveEngine`] wires them all
//! onto one store and one blob backend.

pub mod bookmark;
pub mod context;
pub mod drive;
pub mod engine;
pub mod file;
pub mod folder;
pub mod listing;
mod lookup;
pub mod path;

pub use bookmark::BookmarkService;
pub use context::RequestContext;
pub use drive::{DriveService, QuotaLedger};
pub use engine::DriveEngine;
pub use file::{DownloadResult, DownloadService, FileService, UploadService};
pub use folder::{CascadeOrchestrator, FolderService, HardDeleteReport};
pub use listing::ListingService;
pub use path::{ParentContext, PathResolver};
