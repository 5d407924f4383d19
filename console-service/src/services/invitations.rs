//! Invitation token issuing and validation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::InviteConfig;
use crate::models::InviteToken;
use crate::services::{DocumentStore, ServiceError};

/// An invitation ready to hand to the prospective administrator.
#[derive(Debug, Clone)]
pub struct IssuedInvite {
    pub token: String,
    pub signup_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn DocumentStore>,
    signup_base_url: String,
    token_ttl_hours: i64,
}

impl InvitationService {
    pub fn new(store: Arc<dyn DocumentStore>, config: &InviteConfig) -> Self {
        Self {
            store,
            signup_base_url: config.signup_base_url.clone(),
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    pub async fn issue(&self) -> Result<IssuedInvite, ServiceError> {
        let token = generate_invite_token();
        let record = InviteToken::new(token.clone(), self.token_ttl_hours);

        self.store
            .insert_invite_token(&record)
            .await
            .map_err(ServiceError::Store)?;

        let signup_url = format!("{}?token={}", self.signup_base_url, token);

        tracing::info!(expires_at = %record.expires_at, "Invitation token issued");

        Ok(IssuedInvite {
            token,
            signup_url,
            expires_at: record.expires_at,
        })
    }

    pub async fn validate(&self, token: &str) -> Result<InviteToken, ServiceError> {
        let record = self
            .store
            .find_invite_token(token)
            .await
            .map_err(ServiceError::Store)?
            .ok_or(ServiceError::InvalidToken)?;

        if record.is_expired() {
            return Err(ServiceError::TokenExpired);
        }
        if record.is_consumed() {
            return Err(ServiceError::TokenAlreadyUsed);
        }

        Ok(record)
    }

    /// Validate and atomically claim the token. A race lost to a concurrent
    /// registration surfaces as the conditional write matching nothing.
    pub async fn consume(&self, token: &str) -> Result<(), ServiceError> {
        self.validate(token).await?;

        let claimed = self
            .store
            .consume_invite_token(token)
            .await
            .map_err(ServiceError::Store)?;

        if claimed {
            Ok(())
        } else {
            Err(ServiceError::TokenAlreadyUsed)
        }
    }

    /// Best-effort compensation when registration fails after the claim.
    pub async fn release(&self, token: &str) {
        if let Err(e) = self.store.release_invite_token(token).await {
            tracing::error!(error = %e, "Failed to release invitation token");
        }
    }
}

fn generate_invite_token() -> String {
    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 16] = rng.gen();
    hex::encode(token_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use chrono::Duration;

    fn service() -> (Arc<MemoryStore>, InvitationService) {
        let store = Arc::new(MemoryStore::new());
        let config = InviteConfig {
            signup_base_url: "http://localhost:3000/signup.html".to_string(),
            token_ttl_hours: 24,
        };
        let service = InvitationService::new(store.clone(), &config);
        (store, service)
    }

    #[tokio::test]
    async fn issued_token_validates_and_carries_signup_url() {
        let (_store, invitations) = service();

        let invite = invitations.issue().await.unwrap();
        assert!(invite.signup_url.ends_with(&format!("?token={}", invite.token)));
        assert_eq!(invite.token.len(), 32);

        let record = invitations.validate(&invite.token).await.unwrap();
        assert_eq!(record.token, invite.token);
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let (_store, invitations) = service();
        let err = invitations.validate("does-not-exist").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_regardless_of_call_order() {
        let (store, invitations) = service();

        let mut record = InviteToken::new("deadbeef".to_string(), 24);
        record.expires_at = Utc::now() - Duration::hours(1);
        store.insert_invite_token(&record).await.unwrap();

        for _ in 0..2 {
            let err = invitations.validate("deadbeef").await.unwrap_err();
            assert!(matches!(err, ServiceError::TokenExpired));
        }
    }

    #[tokio::test]
    async fn consume_is_single_use_until_released() {
        let (_store, invitations) = service();
        let invite = invitations.issue().await.unwrap();

        invitations.consume(&invite.token).await.unwrap();

        let err = invitations.consume(&invite.token).await.unwrap_err();
        assert!(matches!(err, ServiceError::TokenAlreadyUsed));

        invitations.release(&invite.token).await;
        invitations.consume(&invite.token).await.unwrap();
    }
}
