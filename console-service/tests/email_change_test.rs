//! Integration tests for the two-phase email-change workflow.

mod common;

use common::{error_of, TestApp};
use console_service::services::DocumentStore;

async fn request_change(
    app: &TestApp,
    token: &str,
    new_email: &str,
    current_password: &str,
) -> reqwest::Response {
    app.client
        .post(app.url("/account/email"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "new_email": new_email,
            "current_password": current_password,
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn intent_is_filed_without_touching_the_authoritative_email() {
    let app = TestApp::spawn().await;
    let uid = app.seed_admin("a@x.com", "admin-pass", "Ada").await;
    let token = app.login_token("a@x.com", "admin-pass").await;

    let resp = request_change(&app, &token, "b@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 200);

    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert_eq!(account.email, "a@x.com");
    assert_eq!(account.pending_email.as_deref(), Some("b@x.com"));

    // The provider still authenticates the old address only.
    assert_eq!(app.identity.email_of(&uid).as_deref(), Some("a@x.com"));
}

#[tokio::test]
async fn wrong_password_aborts_with_no_state_change() {
    let app = TestApp::spawn().await;
    let uid = app.seed_admin("a@x.com", "admin-pass", "Ada").await;
    let token = app.login_token("a@x.com", "admin-pass").await;

    let resp = request_change(&app, &token, "b@x.com", "wrong").await;
    assert_eq!(resp.status().as_u16(), 401);
    assert!(error_of(resp).await.contains("Invalid current password"));

    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert!(account.pending_email.is_none());
}

#[tokio::test]
async fn unchanged_email_is_a_validation_error() {
    let app = TestApp::spawn().await;
    app.seed_admin("a@x.com", "admin-pass", "Ada").await;
    let token = app.login_token("a@x.com", "admin-pass").await;

    let resp = request_change(&app, &token, "a@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 400);
    assert!(error_of(resp).await.contains("same as the current email"));
}

#[tokio::test]
async fn federated_accounts_cannot_change_email_here() {
    let app = TestApp::spawn().await;
    let uid = app
        .identity
        .seed_federated_account("g@x.com", "admin-pass", "google.com");
    let account = console_service::models::UserAccount {
        uid: uid.clone(),
        email: "g@x.com".to_string(),
        display_name: "Fed".to_string(),
        role: "admin".to_string(),
        profile_picture_url: None,
        pending_email: None,
        created_at: chrono::Utc::now(),
    };
    app.store.put_account(&account).await.unwrap();

    let token = app.login_token("g@x.com", "admin-pass").await;
    let resp = request_change(&app, &token, "new@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 400);
    assert!(error_of(resp).await.contains("federated"));

    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert!(account.pending_email.is_none());
}

#[tokio::test]
async fn new_address_already_registered_surfaces_as_conflict() {
    let app = TestApp::spawn().await;
    app.seed_admin("a@x.com", "admin-pass", "Ada").await;
    app.identity.seed_account("b@x.com", "other-pass");
    let token = app.login_token("a@x.com", "admin-pass").await;

    let resp = request_change(&app, &token, "b@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn verified_change_commits_on_next_sign_in_exactly_once() {
    let app = TestApp::spawn().await;
    let uid = app.seed_admin("a@x.com", "admin-pass", "Ada").await;
    let token = app.login_token("a@x.com", "admin-pass").await;

    let resp = request_change(&app, &token, "b@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 200);

    // The user clicks the verification link: the provider's authoritative
    // email flips, the console's document does not.
    assert!(app.identity.complete_email_verification(&uid));
    assert_eq!(app.identity.email_of(&uid).as_deref(), Some("b@x.com"));
    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert_eq!(account.email, "a@x.com");

    // Next sign-in reconciles and reports the commit.
    let resp = app.login("b@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["email"].as_str().unwrap(), "b@x.com");
    assert!(body["email_change_committed"].as_bool().unwrap());

    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert_eq!(account.email, "b@x.com");
    assert!(account.pending_email.is_none());

    // The marker was cleared exactly once; later sign-ins are quiet.
    let resp = app.login("b@x.com", "admin-pass").await;
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(!body["email_change_committed"].as_bool().unwrap());
}

#[tokio::test]
async fn unverified_intent_stays_filed_across_sign_ins() {
    let app = TestApp::spawn().await;
    let uid = app.seed_admin("a@x.com", "admin-pass", "Ada").await;
    let token = app.login_token("a@x.com", "admin-pass").await;

    let resp = request_change(&app, &token, "b@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 200);

    // Without the verification click the old address keeps signing in and
    // the intent stays put.
    let resp = app.login("a@x.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(!body["email_change_committed"].as_bool().unwrap());

    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert_eq!(account.email, "a@x.com");
    assert_eq!(account.pending_email.as_deref(), Some("b@x.com"));
}
