//! Email-change verification workflow: verify-then-commit.
//!
//! The intent is filed here; the commit happens in the access gate once
//! the provider's authoritative email is observed to match it.

use std::sync::Arc;

use crate::models::Session;
use crate::services::{
    DocumentStore, IdentityError, IdentityProvider, ServiceError, PASSWORD_PROVIDER,
};

#[derive(Clone)]
pub struct EmailChangeService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl EmailChangeService {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// File an email-change intent.
    ///
    /// Re-authenticates the caller, refuses federated accounts, has the
    /// provider mail a verification link to the new address, and only then
    /// records `pending_email`. The authoritative email is untouched until
    /// the gate observes the verification landed.
    pub async fn request_change(
        &self,
        session: &Session,
        new_email: &str,
        current_password: &str,
    ) -> Result<(), ServiceError> {
        if new_email.eq_ignore_ascii_case(&session.email) {
            return Err(ServiceError::Validation(
                "New email cannot be the same as the current email".to_string(),
            ));
        }

        self.identity
            .reauthenticate(&session.email, current_password)
            .await
            .map_err(as_invalid_credential)?;

        let info = self.identity.account_info(&session.uid).await?;
        if info.sign_in_provider != PASSWORD_PROVIDER {
            return Err(ServiceError::Identity(IdentityError::FederatedIdentity));
        }

        self.identity
            .send_email_change_verification(&session.uid, new_email)
            .await?;

        let matched = self
            .store
            .set_pending_email(&session.uid, new_email)
            .await
            .map_err(ServiceError::Store)?;

        if !matched {
            return Err(ServiceError::AccountRecordMissing);
        }

        tracing::info!(uid = %session.uid, "Email change verification sent");
        Ok(())
    }
}

/// A failed re-authentication is always reported as a bad current
/// password, whatever the provider said about the account.
fn as_invalid_credential(err: IdentityError) -> ServiceError {
    match err {
        IdentityError::WrongPassword | IdentityError::UserNotFound => {
            ServiceError::Identity(IdentityError::InvalidCredential)
        }
        other => ServiceError::Identity(other),
    }
}
