//! User account model - console-side account documents, keyed by the
//! identity-provider subject id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PendingRegistration, Role};

/// Console account document.
///
/// Only approved accounts carry role "admin"; the access gate rejects every
/// other role value, including values it has never seen. `pending_email`
/// marks an email change whose verification link has been sent but whose
/// ownership proof has not yet been observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(rename = "_id")]
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Build an account document from an approved application.
    pub fn from_pending(pending: &PendingRegistration, role: Role) -> Self {
        Self {
            uid: pending.uid.clone(),
            email: pending.email.clone(),
            display_name: pending.display_name.clone(),
            role: role.as_str().to_string(),
            profile_picture_url: None,
            pending_email: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    pub fn is_pending(&self) -> bool {
        self.role == Role::Pending.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_from_pending_carries_identity_fields() {
        let pending = PendingRegistration::new(
            "uid-1".to_string(),
            "new.admin@example.com".to_string(),
            "New Admin".to_string(),
        );
        let account = UserAccount::from_pending(&pending, Role::Admin);

        assert_eq!(account.uid, "uid-1");
        assert_eq!(account.email, "new.admin@example.com");
        assert!(account.is_admin());
        assert!(account.pending_email.is_none());
    }

    #[test]
    fn unknown_role_is_neither_admin_nor_pending() {
        let pending = PendingRegistration::new(
            "uid-2".to_string(),
            "x@example.com".to_string(),
            "X".to_string(),
        );
        let mut account = UserAccount::from_pending(&pending, Role::Pending);
        account.role = "moderator".to_string();

        assert!(!account.is_admin());
        assert!(!account.is_pending());
    }
}
