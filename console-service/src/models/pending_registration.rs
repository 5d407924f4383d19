//! Pending registration model - applications awaiting administrator review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

/// An account application filed at registration time.
///
/// Owned by the registration workflow until approval consumes it; deleted
/// on both approval and rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRegistration {
    #[serde(rename = "_id")]
    pub id: String,
    /// Identity-provider subject id of the applicant.
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl PendingRegistration {
    pub fn new(uid: String, email: String, display_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uid,
            email,
            display_name,
            role: Role::Pending.as_str().to_string(),
            created_at: Utc::now(),
        }
    }
}
