//! Bookmarks.

pub mod service;

pub use service::BookmarkService;
