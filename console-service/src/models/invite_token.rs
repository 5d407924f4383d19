//! Invitation token model - single-use, time-bounded registration tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registration token handed out by an administrator.
///
/// Valid only while present in the store, unexpired, and not yet consumed.
/// Consumption is a conditional write on `consumed_at`, so two concurrent
/// registrations cannot both claim the same token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteToken {
    #[serde(rename = "_id")]
    pub id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub consumed_at: Option<DateTime<Utc>>,
}

impl InviteToken {
    pub fn new(token: String, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            token,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
            consumed_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}
