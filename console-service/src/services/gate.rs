//! Access gate: role enforcement at sign-in and session restore.

use std::sync::Arc;

use crate::models::{Session, UserAccount};
use crate::services::{DocumentStore, IdentityProvider, ProviderSession, ServiceError};

#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ServiceError> {
        let provider_session = self.identity.sign_in(email, password).await?;
        self.admit(provider_session).await
    }

    /// Re-evaluate an existing provider session. Runs on every
    /// authenticated request, which is also where a verified email change
    /// is lazily committed.
    pub async fn restore(&self, token: &str) -> Result<Session, ServiceError> {
        let provider_session = self.identity.verify_session(token).await?;
        self.admit(provider_session).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.identity.sign_out(token).await?;
        Ok(())
    }

    async fn admit(&self, provider_session: ProviderSession) -> Result<Session, ServiceError> {
        let account = match self
            .store
            .find_account(&provider_session.uid)
            .await
            .map_err(ServiceError::Store)?
        {
            Some(account) => account,
            None => {
                // Authenticated but unknown to the console. The provider
                // session must be dead before the error is returned, or a
                // caller ignoring the error keeps a live session.
                self.force_sign_out(&provider_session.token).await;
                return Err(ServiceError::AccountRecordMissing);
            }
        };

        if account.is_pending() {
            self.force_sign_out(&provider_session.token).await;
            return Err(ServiceError::PendingApproval);
        }

        if !account.is_admin() {
            self.force_sign_out(&provider_session.token).await;
            return Err(ServiceError::AccessDenied);
        }

        let (account, email_change_committed) =
            self.reconcile_email(account, &provider_session).await?;

        Ok(Session {
            uid: account.uid,
            email: account.email,
            display_name: account.display_name,
            role: account.role,
            token: provider_session.token,
            email_change_committed,
        })
    }

    async fn force_sign_out(&self, token: &str) {
        if let Err(e) = self.identity.sign_out(token).await {
            tracing::error!(error = %e, "Failed to sign out rejected session");
        }
    }

    /// Commit a pending email change once the provider's authoritative
    /// email matches the filed intent. The conditional write clears the
    /// marker exactly once even when two sessions race the commit.
    async fn reconcile_email(
        &self,
        mut account: UserAccount,
        provider_session: &ProviderSession,
    ) -> Result<(UserAccount, bool), ServiceError> {
        let Some(pending) = account.pending_email.clone() else {
            return Ok((account, false));
        };

        if pending != provider_session.email {
            // Verification not observed yet; the intent stays filed.
            return Ok((account, false));
        }

        let committed = self
            .store
            .commit_pending_email(&account.uid, &pending)
            .await
            .map_err(ServiceError::Store)?;

        if committed {
            tracing::info!(uid = %account.uid, "Verified email change committed");
        }

        account.email = pending;
        account.pending_email = None;
        Ok((account, committed))
    }
}
