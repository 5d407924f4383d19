//! Account settings: display name and password.

use std::sync::Arc;

use crate::models::Session;
use crate::services::{DocumentStore, IdentityError, IdentityProvider, ServiceError};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Update the display name on the provider profile and the account
    /// document.
    pub async fn update_display_name(
        &self,
        session: &Session,
        display_name: &str,
    ) -> Result<(), ServiceError> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "Username cannot be empty".to_string(),
            ));
        }

        self.identity
            .update_display_name(&session.uid, name)
            .await?;

        let matched = self
            .store
            .update_account_display_name(&session.uid, name)
            .await
            .map_err(ServiceError::Store)?;

        if !matched {
            return Err(ServiceError::AccountRecordMissing);
        }

        tracing::info!(uid = %session.uid, "Display name updated");
        Ok(())
    }

    /// Change the sign-in password; credentials live with the provider, so
    /// nothing is written to the store.
    pub async fn change_password(
        &self,
        session: &Session,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        self.identity
            .reauthenticate(&session.email, current_password)
            .await
            .map_err(|e| match e {
                IdentityError::WrongPassword | IdentityError::UserNotFound => {
                    ServiceError::Identity(IdentityError::InvalidCredential)
                }
                other => ServiceError::Identity(other),
            })?;

        self.identity
            .update_password(&session.uid, new_password)
            .await?;

        tracing::info!(uid = %session.uid, "Password changed");
        Ok(())
    }
}
