//! Approval state machine: pending registrations become admins or vanish.

use std::sync::Arc;

use crate::models::{PendingRegistration, Role, UserAccount};
use crate::services::{DocumentStore, ServiceError};

#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn DocumentStore>,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_pending(&self) -> Result<Vec<PendingRegistration>, ServiceError> {
        self.store.list_pending().await.map_err(ServiceError::Store)
    }

    /// Promote a pending applicant to administrator.
    ///
    /// The uid and record id travel separately from the UI table row, so
    /// both are cross-checked against the stored record before anything is
    /// written. Promotion lands before the pending row is deleted: if the
    /// delete fails the row is still there and a retried approve is
    /// idempotent, so the record can never vanish without the promotion
    /// having taken effect.
    pub async fn approve(&self, uid: &str, pending_id: &str) -> Result<(), ServiceError> {
        let pending = self
            .store
            .find_pending(pending_id)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::NotFound("Pending registration"))?;

        if pending.uid != uid {
            return Err(ServiceError::Validation(
                "Pending registration does not match the given user".to_string(),
            ));
        }

        let promoted = self
            .store
            .update_account_role(uid, Role::Admin.as_str())
            .await
            .map_err(ServiceError::Store)?;

        if !promoted {
            // No account document yet: approval is the provisioning step.
            let account = UserAccount::from_pending(&pending, Role::Admin);
            self.store
                .put_account(&account)
                .await
                .map_err(ServiceError::Store)?;
        }

        self.store
            .delete_pending(pending_id)
            .await
            .map_err(ServiceError::Store)?;

        tracing::info!(uid = %uid, "User approved");
        Ok(())
    }

    /// Reject an application. Deletes the pending row only; the provider
    /// account survives and stays unreachable through the access gate.
    pub async fn reject(&self, pending_id: &str) -> Result<(), ServiceError> {
        let removed = self
            .store
            .delete_pending(pending_id)
            .await
            .map_err(ServiceError::Store)?;

        if !removed {
            return Err(ServiceError::NotFound("Pending registration"));
        }

        tracing::info!(pending_id = %pending_id, "Registration rejected");
        Ok(())
    }
}
