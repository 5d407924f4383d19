//! Integration tests for the invitation-gated registration workflow.

mod common;

use common::{error_of, TestApp};
use console_service::models::InviteToken;
use console_service::services::DocumentStore;

#[tokio::test]
async fn register_with_valid_token_files_pending_application() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    let admin_token = app.login_token("admin@example.com", "admin-pass").await;
    let invite = app.issue_invite(&admin_token).await;

    let resp = app
        .register("bob@example.com", "secret99", "Bob", Some(&invite))
        .await;
    assert_eq!(resp.status().as_u16(), 201);

    let body: serde_json::Value = resp.json().await.unwrap();
    let pending_uid = body["pending_uid"].as_str().unwrap().to_string();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("pending approval"));

    // The provider account exists, the application is filed, and no
    // session was handed out.
    assert!(app.identity.account_exists(&pending_uid));
    let pending = app.store.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].uid, pending_uid);
    assert_eq!(pending[0].email, "bob@example.com");
    assert_eq!(pending[0].role, "pending");

    // No admin account was produced by registration itself.
    assert!(app.store.find_account(&pending_uid).await.unwrap().is_none());
}

#[tokio::test]
async fn register_without_token_is_rejected_before_any_side_effect() {
    let app = TestApp::spawn().await;

    let resp = app
        .register("bob@example.com", "secret99", "Bob", None)
        .await;
    assert_eq!(resp.status().as_u16(), 400);
    assert!(error_of(resp).await.contains("token is missing"));

    assert!(app.store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn register_with_unknown_token_fails() {
    let app = TestApp::spawn().await;

    let resp = app
        .register("bob@example.com", "secret99", "Bob", Some("no-such-token"))
        .await;
    assert_eq!(resp.status().as_u16(), 400);
    assert!(error_of(resp).await.contains("Invalid registration token"));
}

#[tokio::test]
async fn register_with_expired_token_fails() {
    let app = TestApp::spawn().await;

    // A token whose 24h window has already passed.
    let mut record = InviteToken::new("feedfacecafebeef".to_string(), 24);
    record.expires_at = chrono::Utc::now() - chrono::Duration::hours(1);
    app.store.insert_invite_token(&record).await.unwrap();

    let resp = app
        .register("bob@example.com", "secret99", "Bob", Some("feedfacecafebeef"))
        .await;
    assert_eq!(resp.status().as_u16(), 400);
    assert!(error_of(resp).await.contains("expired"));
}

#[tokio::test]
async fn register_inside_validity_window_succeeds() {
    let app = TestApp::spawn().await;

    // One hour left on the clock is still a valid token.
    let mut record = InviteToken::new("0123456789abcdef".to_string(), 24);
    record.expires_at = chrono::Utc::now() + chrono::Duration::hours(1);
    app.store.insert_invite_token(&record).await.unwrap();

    let resp = app
        .register("bob@example.com", "secret99", "Bob", Some("0123456789abcdef"))
        .await;
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn token_is_single_use() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    let admin_token = app.login_token("admin@example.com", "admin-pass").await;
    let invite = app.issue_invite(&admin_token).await;

    let first = app
        .register("bob@example.com", "secret99", "Bob", Some(&invite))
        .await;
    assert_eq!(first.status().as_u16(), 201);

    let second = app
        .register("carol@example.com", "secret99", "Carol", Some(&invite))
        .await;
    assert_eq!(second.status().as_u16(), 400);
    assert!(error_of(second).await.contains("already been used"));
}

#[tokio::test]
async fn duplicate_email_surfaces_and_releases_the_token() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    app.identity.seed_account("taken@example.com", "whatever");

    let admin_token = app.login_token("admin@example.com", "admin-pass").await;
    let invite = app.issue_invite(&admin_token).await;

    let resp = app
        .register("taken@example.com", "secret99", "Imposter", Some(&invite))
        .await;
    assert_eq!(resp.status().as_u16(), 409);
    assert!(error_of(resp).await.contains("already registered"));

    // The collision did not burn the invite.
    let retry = app
        .register("fresh@example.com", "secret99", "Fresh", Some(&invite))
        .await;
    assert_eq!(retry.status().as_u16(), 201);
}

#[tokio::test]
async fn register_validates_input_before_any_network_call() {
    let app = TestApp::spawn().await;

    let resp = app
        .register("bob@example.com", "short", "Bob", Some("irrelevant"))
        .await;
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app
        .register("not-an-email", "secret99", "Bob", Some("irrelevant"))
        .await;
    assert_eq!(resp.status().as_u16(), 422);
}
