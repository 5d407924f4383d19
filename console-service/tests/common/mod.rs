//! Test helper module for console-service integration tests.
//!
//! Serves the full router over the in-memory doubles on an ephemeral port;
//! no external backends are required.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use console_core::config as core_config;
use console_service::{
    build_router,
    config::{
        ConsoleConfig, Environment, IdentityConfig, InviteConfig, MongoConfig, SecurityConfig,
        SwaggerConfig, SwaggerMode,
    },
    models::{Role, UserAccount},
    services::{DocumentStore, IdentityProvider, MemoryStore, MockIdentityProvider},
    AppState,
};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MockIdentityProvider>,
}

impl TestApp {
    /// Spawn the application over fresh in-memory collaborators.
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MockIdentityProvider::new());

        let state = AppState::new(
            test_config(),
            store.clone() as Arc<dyn DocumentStore>,
            identity.clone() as Arc<dyn IdentityProvider>,
        );

        let app = build_router(state).await.expect("Failed to build router");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            address,
            client: reqwest::Client::new(),
            store,
            identity,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Provision an approved administrator directly in both collaborators.
    pub async fn seed_admin(&self, email: &str, password: &str, name: &str) -> String {
        let uid = self.identity.seed_account(email, password);
        let account = UserAccount {
            uid: uid.clone(),
            email: email.to_string(),
            display_name: name.to_string(),
            role: Role::Admin.as_str().to_string(),
            profile_picture_url: None,
            pending_email: None,
            created_at: Utc::now(),
        };
        self.store.put_account(&account).await.unwrap();
        uid
    }

    /// Provision an account document with an arbitrary role.
    pub async fn seed_account_with_role(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: &str,
    ) -> String {
        let uid = self.identity.seed_account(email, password);
        let account = UserAccount {
            uid: uid.clone(),
            email: email.to_string(),
            display_name: name.to_string(),
            role: role.to_string(),
            profile_picture_url: None,
            pending_email: None,
            created_at: Utc::now(),
        };
        self.store.put_account(&account).await.unwrap();
        uid
    }

    /// Sign in and return the session token, asserting success.
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let resp = self.login(email, password).await;
        assert!(
            resp.status().is_success(),
            "login failed with status {}",
            resp.status()
        );
        let body: serde_json::Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Issue an invitation as an admin and return its token.
    pub async fn issue_invite(&self, admin_token: &str) -> String {
        let resp = self
            .client
            .post(self.url("/admin/invitations"))
            .bearer_auth(admin_token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        token: Option<&str>,
    ) -> reqwest::Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "display_name": display_name,
                "token": token,
            }))
            .send()
            .await
            .unwrap()
    }
}

/// Extract the error message of an error response body.
pub async fn error_of(resp: reqwest::Response) -> String {
    let body: serde_json::Value = resp.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

fn test_config() -> ConsoleConfig {
    ConsoleConfig {
        common: core_config::Config {
            port: 0,
            otlp_endpoint: None,
        },
        environment: Environment::Dev,
        service_name: "console-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://unused".to_string(),
            database: "unused".to_string(),
        },
        identity: IdentityConfig {
            base_url: "http://unused".to_string(),
            api_key: "unused".to_string(),
        },
        invites: InviteConfig {
            signup_base_url: "http://localhost:3000/signup.html".to_string(),
            token_ttl_hours: 24,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}
