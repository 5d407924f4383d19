//! Integration tests for account settings: display name and password.

mod common;

use common::{error_of, TestApp};
use console_service::services::DocumentStore;

#[tokio::test]
async fn display_name_updates_provider_and_document() {
    let app = TestApp::spawn().await;
    let uid = app.seed_admin("admin@example.com", "admin-pass", "Old Name").await;
    let token = app.login_token("admin@example.com", "admin-pass").await;

    let resp = app
        .client
        .patch(app.url("/account/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "display_name": "New Name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let account = app.store.find_account(&uid).await.unwrap().unwrap();
    assert_eq!(account.display_name, "New Name");
    assert_eq!(app.identity.display_name_of(&uid).as_deref(), Some("New Name"));
}

#[tokio::test]
async fn empty_display_name_is_rejected() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    let token = app.login_token("admin@example.com", "admin-pass").await;

    let resp = app
        .client
        .patch(app.url("/account/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "display_name": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    let token = app.login_token("admin@example.com", "admin-pass").await;

    let resp = app
        .client
        .post(app.url("/account/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "current_password": "wrong",
            "new_password": "brand-new-pass",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    assert!(error_of(resp).await.contains("Invalid current password"));
}

#[tokio::test]
async fn password_change_takes_effect_at_the_provider() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    let token = app.login_token("admin@example.com", "admin-pass").await;

    let resp = app
        .client
        .post(app.url("/account/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "current_password": "admin-pass",
            "new_password": "brand-new-pass",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.login("admin@example.com", "admin-pass").await;
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app.login("admin@example.com", "brand-new-pass").await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn short_new_password_is_rejected() {
    let app = TestApp::spawn().await;
    app.seed_admin("admin@example.com", "admin-pass", "Admin").await;
    let token = app.login_token("admin@example.com", "admin-pass").await;

    let resp = app
        .client
        .post(app.url("/account/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "current_password": "admin-pass",
            "new_password": "tiny",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}
