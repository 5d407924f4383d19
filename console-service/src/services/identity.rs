//! Identity provider boundary.
//!
//! The hosted identity service owns credentials, sessions, and
//! email-verification delivery; the console only ever talks to it through
//! this trait. `IdentityClient` is the production REST client,
//! `MockIdentityProvider` the in-memory double the test suite drives.

use async_trait::async_trait;
use console_core::error::AppError;
use dashmap::DashMap;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Sign-in method code the provider reports for password accounts.
pub const PASSWORD_PROVIDER: &str = "password";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("This email is already registered")]
    EmailAlreadyInUse,

    #[error("No account found with this email")]
    UserNotFound,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Invalid current password")]
    InvalidCredential,

    #[error("This operation requires a recent sign-in")]
    RequiresRecentLogin,

    #[error("Operation not allowed")]
    OperationNotAllowed,

    #[error("Email changes are not supported for federated sign-in accounts")]
    FederatedIdentity,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Identity provider error: {0}")]
    Upstream(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailAlreadyInUse => {
                AppError::Conflict(anyhow::anyhow!("This email is already registered"))
            }
            IdentityError::UserNotFound => {
                AppError::AuthError(anyhow::anyhow!("No account found with this email"))
            }
            IdentityError::WrongPassword => {
                AppError::AuthError(anyhow::anyhow!("Incorrect password"))
            }
            IdentityError::InvalidCredential => {
                AppError::AuthError(anyhow::anyhow!("Invalid current password"))
            }
            IdentityError::RequiresRecentLogin => AppError::AuthError(anyhow::anyhow!(
                "This operation requires a recent sign-in"
            )),
            IdentityError::OperationNotAllowed => {
                AppError::Forbidden(anyhow::anyhow!("Operation not allowed"))
            }
            IdentityError::FederatedIdentity => AppError::BadRequest(anyhow::anyhow!(
                "Email changes are not supported for federated sign-in accounts"
            )),
            IdentityError::InvalidSession => {
                AppError::Unauthorized(anyhow::anyhow!("Session is invalid or expired"))
            }
            IdentityError::Upstream(msg) => AppError::BadGateway(msg),
        }
    }
}

/// Account data as the provider reports it.
#[derive(Debug, Clone)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
    pub sign_in_provider: String,
}

/// A provider-held session; the console mirrors it only after the access
/// gate has admitted it.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub uid: String,
    /// The provider's current authoritative email for this subject.
    pub email: String,
    pub token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError>;

    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError>;

    async fn sign_in(&self, email: &str, password: &str)
        -> Result<ProviderSession, IdentityError>;

    async fn verify_session(&self, token: &str) -> Result<ProviderSession, IdentityError>;

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    async fn reauthenticate(&self, email: &str, current_password: &str)
        -> Result<(), IdentityError>;

    async fn account_info(&self, uid: &str) -> Result<ProviderUser, IdentityError>;

    /// Ask the provider to mail a verification link to `new_email` without
    /// touching the authoritative address.
    async fn send_email_change_verification(
        &self,
        uid: &str,
        new_email: &str,
    ) -> Result<(), IdentityError>;

    async fn update_display_name(&self, uid: &str, display_name: &str)
        -> Result<(), IdentityError>;

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError>;
}

// ============================================================================
// REST client
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    uid: String,
    #[serde(default)]
    email: String,
    #[serde(default = "default_provider")]
    sign_in_provider: String,
}

fn default_provider() -> String {
    PASSWORD_PROVIDER.to_string()
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    uid: String,
    email: String,
    #[serde(default)]
    session_token: String,
}

/// REST client for the hosted identity service.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(config: &crate::config::IdentityConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

        tracing::info!(base_url = %config.base_url, "Identity client configured");

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Translate a non-success response into the typed error taxonomy.
    async fn fail(resp: reqwest::Response) -> IdentityError {
        let status = resp.status();
        let code = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error.map(|e| e.code))
            .unwrap_or_default();

        match code.as_str() {
            "EMAIL_EXISTS" => IdentityError::EmailAlreadyInUse,
            "EMAIL_NOT_FOUND" => IdentityError::UserNotFound,
            "INVALID_PASSWORD" => IdentityError::WrongPassword,
            "INVALID_CREDENTIAL" => IdentityError::InvalidCredential,
            "REQUIRES_RECENT_LOGIN" => IdentityError::RequiresRecentLogin,
            "OPERATION_NOT_ALLOWED" => IdentityError::OperationNotAllowed,
            "FEDERATED_IDENTITY" => IdentityError::FederatedIdentity,
            "INVALID_SESSION" | "SESSION_EXPIRED" => IdentityError::InvalidSession,
            other => IdentityError::Upstream(format!("{}: {}", status, other)),
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError> {
        let resp = self
            .http
            .post(self.url("/v1/accounts"))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }

        let body: AccountBody = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        Ok(ProviderUser {
            uid: body.uid,
            email: email.to_string(),
            sign_in_provider: PASSWORD_PROVIDER.to_string(),
        })
    }

    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .delete(self.url(&format!("/v1/accounts/{}", uid)))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        Ok(())
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let resp = self
            .http
            .post(self.url("/v1/sessions"))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }

        let body: SessionBody = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        Ok(ProviderSession {
            uid: body.uid,
            email: body.email,
            token: body.session_token,
        })
    }

    async fn verify_session(&self, token: &str) -> Result<ProviderSession, IdentityError> {
        let resp = self
            .http
            .get(self.url("/v1/sessions/current"))
            .header("x-api-key", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }

        let body: SessionBody = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        Ok(ProviderSession {
            uid: body.uid,
            email: body.email,
            token: token.to_string(),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .delete(self.url("/v1/sessions/current"))
            .header("x-api-key", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        Ok(())
    }

    async fn reauthenticate(
        &self,
        email: &str,
        current_password: &str,
    ) -> Result<(), IdentityError> {
        let resp = self
            .http
            .post(self.url("/v1/accounts/reauthenticate"))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": current_password }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        Ok(())
    }

    async fn account_info(&self, uid: &str) -> Result<ProviderUser, IdentityError> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/accounts/{}", uid)))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }

        let body: AccountBody = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        Ok(ProviderUser {
            uid: body.uid,
            email: body.email,
            sign_in_provider: body.sign_in_provider,
        })
    }

    async fn send_email_change_verification(
        &self,
        uid: &str,
        new_email: &str,
    ) -> Result<(), IdentityError> {
        let resp = self
            .http
            .post(self.url(&format!("/v1/accounts/{}/email-change", uid)))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "new_email": new_email }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        Ok(())
    }

    async fn update_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let resp = self
            .http
            .patch(self.url(&format!("/v1/accounts/{}", uid)))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "display_name": display_name }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .patch(self.url(&format!("/v1/accounts/{}", uid)))
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp).await);
        }
        Ok(())
    }
}

// ============================================================================
// In-memory double
// ============================================================================

#[derive(Debug, Clone)]
struct MockAccount {
    uid: String,
    email: String,
    password: String,
    display_name: Option<String>,
    sign_in_provider: String,
    /// Email awaiting the user's click on the verification link.
    pending_verification: Option<String>,
}

/// In-memory identity provider for tests and local development.
#[derive(Default)]
pub struct MockIdentityProvider {
    accounts: DashMap<String, MockAccount>,
    sessions: DashMap<String, String>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a password account directly, bypassing the registration flow.
    pub fn seed_account(&self, email: &str, password: &str) -> String {
        self.insert_account(email, password, PASSWORD_PROVIDER)
    }

    /// Create an account whose email is owned by a federated provider.
    pub fn seed_federated_account(&self, email: &str, password: &str, provider: &str) -> String {
        self.insert_account(email, password, provider)
    }

    fn insert_account(&self, email: &str, password: &str, provider: &str) -> String {
        let uid = Uuid::new_v4().simple().to_string();
        self.accounts.insert(
            uid.clone(),
            MockAccount {
                uid: uid.clone(),
                email: email.to_string(),
                password: password.to_string(),
                display_name: None,
                sign_in_provider: provider.to_string(),
                pending_verification: None,
            },
        );
        uid
    }

    fn find_by_email(&self, email: &str) -> Option<MockAccount> {
        self.accounts
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone())
    }

    /// Simulate the user clicking the verification link: the provider's
    /// authoritative email becomes the pending one.
    pub fn complete_email_verification(&self, uid: &str) -> bool {
        if let Some(mut account) = self.accounts.get_mut(uid) {
            if let Some(new_email) = account.pending_verification.take() {
                account.email = new_email;
                return true;
            }
        }
        false
    }

    pub fn account_exists(&self, uid: &str) -> bool {
        self.accounts.contains_key(uid)
    }

    pub fn email_of(&self, uid: &str) -> Option<String> {
        self.accounts.get(uid).map(|a| a.email.clone())
    }

    pub fn display_name_of(&self, uid: &str) -> Option<String> {
        self.accounts.get(uid).and_then(|a| a.display_name.clone())
    }

    pub fn has_session(&self, token: &str) -> bool {
        self.sessions.contains_key(token)
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError> {
        if self.find_by_email(email).is_some() {
            return Err(IdentityError::EmailAlreadyInUse);
        }
        let uid = self.insert_account(email, password, PASSWORD_PROVIDER);
        Ok(ProviderUser {
            uid,
            email: email.to_string(),
            sign_in_provider: PASSWORD_PROVIDER.to_string(),
        })
    }

    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError> {
        if self.accounts.remove(uid).is_none() {
            return Err(IdentityError::UserNotFound);
        }
        self.sessions.retain(|_, session_uid| session_uid.as_str() != uid);
        Ok(())
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let account = self.find_by_email(email).ok_or(IdentityError::UserNotFound)?;
        if account.password != password {
            return Err(IdentityError::WrongPassword);
        }

        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), account.uid.clone());

        Ok(ProviderSession {
            uid: account.uid,
            email: account.email,
            token,
        })
    }

    async fn verify_session(&self, token: &str) -> Result<ProviderSession, IdentityError> {
        let uid = self
            .sessions
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or(IdentityError::InvalidSession)?;

        let account = self
            .accounts
            .get(&uid)
            .map(|entry| entry.value().clone())
            .ok_or(IdentityError::InvalidSession)?;

        Ok(ProviderSession {
            uid: account.uid,
            email: account.email,
            token: token.to_string(),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn reauthenticate(
        &self,
        email: &str,
        current_password: &str,
    ) -> Result<(), IdentityError> {
        let account = self
            .find_by_email(email)
            .ok_or(IdentityError::InvalidCredential)?;
        if account.password != current_password {
            return Err(IdentityError::InvalidCredential);
        }
        Ok(())
    }

    async fn account_info(&self, uid: &str) -> Result<ProviderUser, IdentityError> {
        let account = self
            .accounts
            .get(uid)
            .map(|entry| entry.value().clone())
            .ok_or(IdentityError::UserNotFound)?;

        Ok(ProviderUser {
            uid: account.uid,
            email: account.email,
            sign_in_provider: account.sign_in_provider,
        })
    }

    async fn send_email_change_verification(
        &self,
        uid: &str,
        new_email: &str,
    ) -> Result<(), IdentityError> {
        if let Some(existing) = self.find_by_email(new_email) {
            if existing.uid != uid {
                return Err(IdentityError::EmailAlreadyInUse);
            }
        }

        let mut account = self.accounts.get_mut(uid).ok_or(IdentityError::UserNotFound)?;
        if account.sign_in_provider != PASSWORD_PROVIDER {
            return Err(IdentityError::OperationNotAllowed);
        }
        account.pending_verification = Some(new_email.to_string());
        Ok(())
    }

    async fn update_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let mut account = self.accounts.get_mut(uid).ok_or(IdentityError::UserNotFound)?;
        account.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError> {
        let mut account = self.accounts.get_mut(uid).ok_or(IdentityError::UserNotFound)?;
        account.password = new_password.to_string();
        Ok(())
    }
}
