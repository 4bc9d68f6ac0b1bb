//! Drive domain entities.

pub mod model;
pub mod quota;

pub use model::{CreateDrive, Drive};
pub use quota::DriveQuota;
