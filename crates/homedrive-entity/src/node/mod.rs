//! Node references and directory listings.

pub mod listing;
pub mod reference;

pub use listing::DirectoryListing;
pub use reference::NodeRef;
