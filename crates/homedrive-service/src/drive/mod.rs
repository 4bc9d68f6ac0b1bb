//! Drives and their quota.

pub mod quota;
pub mod service;

pub use quota::QuotaLedger;
pub use service::DriveService;
