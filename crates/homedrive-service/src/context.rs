//! Request context carrying the authenticated owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for one engine call.
///
/// The owner has already been authenticated upstream; every lookup the
/// engine performs is scoped to this owner, and records belonging to
/// anyone else are reported as not found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated owner's ID.
    pub owner_id: Uuid,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            request_time: Utc::now(),
        }
    }

    /// Whether a record with the given owner is visible to this request.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.owner_id == owner_id
    }
}
