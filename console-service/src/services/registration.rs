//! Registration workflow: token-gated account creation.

use std::sync::Arc;

use crate::models::PendingRegistration;
use crate::services::{
    DocumentStore, IdentityProvider, InvitationService, ServiceError,
};

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    invitations: InvitationService,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        invitations: InvitationService,
    ) -> Self {
        Self {
            store,
            identity,
            invitations,
        }
    }

    /// Register an applicant against an invitation token.
    ///
    /// The token is claimed before any provider call; each later step rolls
    /// the earlier ones back on failure, so a failed attempt neither burns
    /// the invite nor leaves an orphaned provider account. Returns the
    /// provider subject id of the filed application.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        token: Option<&str>,
    ) -> Result<String, ServiceError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ServiceError::MissingToken),
        };

        self.invitations.consume(token).await?;

        let provider_user = match self.identity.create_account(email, password).await {
            Ok(user) => user,
            Err(e) => {
                self.invitations.release(token).await;
                return Err(e.into());
            }
        };

        let pending = PendingRegistration::new(
            provider_user.uid.clone(),
            email.to_string(),
            display_name.to_string(),
        );

        if let Err(e) = self.store.insert_pending(&pending).await {
            if let Err(rollback) = self.identity.delete_account(&provider_user.uid).await {
                tracing::error!(
                    uid = %provider_user.uid,
                    error = %rollback,
                    "Failed to delete provider account while rolling back registration"
                );
            }
            self.invitations.release(token).await;
            return Err(ServiceError::Store(e));
        }

        tracing::info!(uid = %provider_user.uid, "Registration submitted for approval");

        Ok(provider_user.uid)
    }
}
