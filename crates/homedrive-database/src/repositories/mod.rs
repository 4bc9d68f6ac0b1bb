//! PostgreSQL query sets for all HomeDrive entities.

pub mod bookmark;
pub mod drive;
pub mod file;
pub mod folder;

pub use bookmark::BookmarkRepository;
pub use drive::DriveRepository;
pub use file::FileRepository;
pub use folder::FolderRepository;
