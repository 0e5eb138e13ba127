use chrono::{DateTime, Utc};

use crate::helpers::TestApp;

#[tokio::test]
async fn unsubscribe_without_token_is_rejected_with_400() {
    let app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/newsletter/unsubscribe", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response
        .json()
        .await
        .expect("Error body is not JSON.");
    assert!(body["error"].as_str().unwrap().contains("token"));
}

#[tokio::test]
async fn unsubscribe_with_an_unknown_token_is_rejected_with_404() {
    let app = TestApp::spawn_app().await;

    let response = app.get_unsubscribe("aUnknownTokenThatWasNeverIssued1").await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn unsubscribe_link_deactivates_an_active_subscriber() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.create_active_subscriber("test@test.com").await;
    let token = test_app.unsubscribe_token_of("test@test.com").await;

    let response = test_app.get_unsubscribe(&token).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["alreadyUnsubscribed"], false);
    assert_eq!(body["language"], "EN");

    let (unsubscribed, rotated_token): (bool, String) = sqlx::query_as(
        "SELECT unsubscribed_at IS NOT NULL, unsubscribe_token FROM subscribers",
    )
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();

    assert!(unsubscribed);
    assert_ne!(rotated_token, token);
}

#[tokio::test]
async fn consumed_unsubscribe_tokens_are_rejected_with_404() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.create_active_subscriber("test@test.com").await;
    let token = test_app.unsubscribe_token_of("test@test.com").await;

    assert_eq!(test_app.get_unsubscribe(&token).await.status(), 200);
    assert_eq!(test_app.get_unsubscribe(&token).await.status(), 404);
}

#[tokio::test]
async fn unsubscribing_an_inactive_subscriber_is_idempotent() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.create_active_subscriber("test@test.com").await;
    test_app
        .get_unsubscribe(&test_app.unsubscribe_token_of("test@test.com").await)
        .await
        .error_for_status()
        .unwrap();

    let live_token = test_app.unsubscribe_token_of("test@test.com").await;
    let unsubscribed_at: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT unsubscribed_at FROM subscribers")
            .fetch_one(&test_app.db_pool)
            .await
            .unwrap();

    let response = test_app.get_unsubscribe(&live_token).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["alreadyUnsubscribed"], true);

    let unchanged: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT unsubscribed_at FROM subscribers")
            .fetch_one(&test_app.db_pool)
            .await
            .unwrap();
    assert_eq!(unchanged, unsubscribed_at);
}

#[tokio::test]
async fn unsubscribe_link_leaves_the_account_flag_untouched() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.insert_account("test@test.com", false).await;
    test_app
        .post_user_newsletter_as("test@test.com", true)
        .await
        .error_for_status()
        .unwrap();
    test_app.create_active_subscriber("test@test.com").await;

    test_app
        .get_unsubscribe(&test_app.unsubscribe_token_of("test@test.com").await)
        .await
        .error_for_status()
        .unwrap();

    let newsletter_subscribed: bool =
        sqlx::query_scalar("SELECT newsletter_subscribed FROM users")
            .fetch_one(&test_app.db_pool)
            .await
            .unwrap();
    assert!(newsletter_subscribed);
}

#[tokio::test]
async fn authenticated_unsubscribe_requires_an_identity() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/newsletter/unsubscribe", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn authenticated_unsubscribe_for_an_unknown_account_is_rejected_with_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.post_unsubscribe_as("ghost@test.com").await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn authenticated_unsubscribe_without_an_account_leaves_the_subscriber_active() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.create_active_subscriber("test@test.com").await;

    let response = test_app.post_unsubscribe_as("test@test.com").await;
    assert_eq!(response.status(), 404);

    let active: bool = sqlx::query_scalar(
        "SELECT confirmed AND unsubscribed_at IS NULL FROM subscribers WHERE email = 'test@test.com'",
    )
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();
    assert!(active);
}

#[tokio::test]
async fn authenticated_unsubscribe_updates_account_and_subscriber() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.insert_account("test@test.com", false).await;
    test_app
        .post_user_newsletter_as("test@test.com", true)
        .await
        .error_for_status()
        .unwrap();
    test_app.create_active_subscriber("test@test.com").await;
    let old_token = test_app.unsubscribe_token_of("test@test.com").await;

    let response = test_app.post_unsubscribe_as("TEST@test.com").await;
    assert_eq!(response.status(), 200);

    let (newsletter_subscribed, confirmed_at_cleared): (bool, bool) = sqlx::query_as(
        "SELECT newsletter_subscribed, newsletter_confirmed_at IS NULL FROM users",
    )
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();
    assert!(!newsletter_subscribed);
    assert!(confirmed_at_cleared);

    let unsubscribed: bool =
        sqlx::query_scalar("SELECT unsubscribed_at IS NOT NULL FROM subscribers")
            .fetch_one(&test_app.db_pool)
            .await
            .unwrap();
    assert!(unsubscribed);
    assert_eq!(test_app.get_unsubscribe(&old_token).await.status(), 404);
}
