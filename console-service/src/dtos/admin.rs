use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{PendingRegistration, StoreListing, UserAccount};

/// Response after issuing an invitation.
#[derive(Debug, Serialize)]
pub struct InviteLinkResponse {
    pub token: String,
    pub signup_url: String,
    pub expires_at: DateTime<Utc>,
}

/// A pending registration row for the review table.
#[derive(Debug, Serialize)]
pub struct PendingRegistrationResponse {
    pub id: String,
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<PendingRegistration> for PendingRegistrationResponse {
    fn from(p: PendingRegistration) -> Self {
        Self {
            id: p.id,
            uid: p.uid,
            email: p.email,
            display_name: p.display_name,
            created_at: p.created_at,
        }
    }
}

/// Body of an approve action; the uid is cross-checked against the stored
/// record.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub uid: String,
}

/// An account row for the user and admin tables.
#[derive(Debug, Serialize)]
pub struct UserAccountResponse {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserAccountResponse {
    fn from(a: UserAccount) -> Self {
        Self {
            uid: a.uid,
            email: a.email,
            display_name: a.display_name,
            role: a.role,
            profile_picture_url: a.profile_picture_url,
            pending_email: a.pending_email,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub admins: Vec<UserAccountResponse>,
    pub users: Vec<UserAccountResponse>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub users: usize,
    pub admins: usize,
    pub stores: usize,
}

#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub id: String,
    pub store_name: String,
    pub opening_time: String,
    pub closing_time: String,
}

impl From<StoreListing> for StoreResponse {
    fn from(s: StoreListing) -> Self {
        Self {
            id: s.id,
            store_name: s.store_name,
            opening_time: s.opening_time,
            closing_time: s.closing_time,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStoreRequest {
    #[validate(length(min = 1, message = "Store name is required"))]
    pub store_name: String,

    #[validate(length(min = 1, message = "Opening time is required"))]
    pub opening_time: String,

    #[validate(length(min = 1, message = "Closing time is required"))]
    pub closing_time: String,
}
