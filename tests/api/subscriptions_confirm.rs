use chrono::{DateTime, Utc};

use crate::helpers::TestApp;

#[tokio::test]
async fn confirmations_without_token_are_rejected_with_400() {
    let app = TestApp::spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/newsletter/confirm", &app.address))
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
async fn confirmations_with_an_unknown_token_are_rejected_with_404() {
    let app = TestApp::spawn_app().await;

    let response = app.get_confirm("aUnknownTokenThatWasNeverIssued1").await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn confirmation_link_activates_the_subscriber() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    test_app.subscribe("test@test.com").await;
    let token = test_app.last_confirmation_token().await;

    let response = test_app.get_confirm(&token).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["alreadyConfirmed"], false);
    assert_eq!(body["language"], "EN");

    let (confirmed, confirmed_at_set): (bool, bool) = sqlx::query_as(
        "SELECT confirmed, confirmed_at IS NOT NULL FROM subscribers WHERE email = 'test@test.com'",
    )
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Failed to fetch saved subscriber.");

    assert!(confirmed);
    assert!(confirmed_at_set);
}

#[tokio::test]
async fn expired_confirmation_tokens_are_rejected_with_410() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    test_app.subscribe("test@test.com").await;
    let token = test_app.last_confirmation_token().await;

    sqlx::query("UPDATE subscribers SET token_expires_at = now() - interval '1 minute'")
        .execute(&test_app.db_pool)
        .await
        .unwrap();

    let response = test_app.get_confirm(&token).await;

    assert_eq!(response.status(), 410);

    let confirmed: bool = sqlx::query_scalar("SELECT confirmed FROM subscribers")
        .fetch_one(&test_app.db_pool)
        .await
        .unwrap();
    assert!(!confirmed);
}

#[tokio::test]
async fn confirmation_tokens_can_only_be_used_once() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    test_app.subscribe("test@test.com").await;
    let token = test_app.last_confirmation_token().await;

    assert_eq!(test_app.get_confirm(&token).await.status(), 200);
    assert_eq!(test_app.get_confirm(&token).await.status(), 404);
}

#[tokio::test]
async fn concurrent_confirmations_transition_at_most_once() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    test_app.subscribe("test@test.com").await;
    let token = test_app.last_confirmation_token().await;

    let (first, second) = tokio::join!(test_app.get_confirm(&token), test_app.get_confirm(&token));
    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort();

    assert_eq!(statuses, vec![200, 404]);
}

#[tokio::test]
async fn pending_token_issued_before_an_account_opt_in_reports_already_confirmed() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;
    test_app.insert_account("test@test.com", false).await;

    test_app.subscribe("test@test.com").await;
    let token = test_app.last_confirmation_token().await;
    test_app
        .post_user_newsletter_as("test@test.com", true)
        .await
        .error_for_status()
        .unwrap();
    let confirmed_at_before = confirmed_at_of(&test_app, "test@test.com").await;

    let response = test_app.get_confirm(&token).await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["alreadyConfirmed"], true);

    let confirmed_at_after = confirmed_at_of(&test_app, "test@test.com").await;
    assert!(confirmed_at_before.is_some());
    assert_eq!(confirmed_at_before, confirmed_at_after);
}

#[tokio::test]
async fn confirmation_records_the_consent_of_the_confirming_request() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    reqwest::Client::new()
        .post(&format!("{}/newsletter/subscribe", test_app.address))
        .header("X-Forwarded-For", "203.0.113.7")
        .json(&serde_json::json!({ "email": "test@test.com" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let token = test_app.last_confirmation_token().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/newsletter/confirm", test_app.address))
        .header("X-Forwarded-For", "198.51.100.4, 10.0.0.1")
        .query(&[("token", token.as_str())])
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), 200);

    let (consented_at, confirmed_at, consent_ip): (
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
        Option<String>,
    ) = sqlx::query_as("SELECT consented_at, confirmed_at, consent_ip FROM subscribers")
        .fetch_one(&test_app.db_pool)
        .await
        .expect("Query to fetch subscribers failed.");

    assert_eq!(consent_ip.as_deref(), Some("198.51.100.4"));
    assert!(consented_at.is_some());
    assert_eq!(consented_at, confirmed_at);
}

async fn confirmed_at_of(test_app: &TestApp, email: &str) -> Option<DateTime<Utc>> {
    sqlx::query_scalar("SELECT confirmed_at FROM subscribers WHERE email = $1")
        .bind(email)
        .fetch_one(&test_app.db_pool)
        .await
        .expect("Query to fetch subscribers failed.")
}

#[tokio::test]
async fn subscriber_lifecycle_from_signup_to_resubscription() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    test_app
        .post_subscription(serde_json::json!({ "email": "a@b.com", "language": "EN" }))
        .await
        .error_for_status()
        .unwrap();
    let first_token = test_app.last_confirmation_token().await;

    let confirmed: serde_json::Value = test_app
        .get_confirm(&first_token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(confirmed["alreadyConfirmed"], false);

    // The consumed token no longer authorizes anything
    assert_eq!(test_app.get_confirm(&first_token).await.status(), 404);

    let unsubscribe_token = test_app.unsubscribe_token_of("a@b.com").await;
    let unsubscribed: serde_json::Value = test_app
        .get_unsubscribe(&unsubscribe_token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(unsubscribed["alreadyUnsubscribed"], false);

    test_app
        .post_subscription(serde_json::json!({ "email": "a@b.com", "language": "EN" }))
        .await
        .error_for_status()
        .unwrap();
    let second_token = test_app.last_confirmation_token().await;

    let (confirmed, unsubscribed): (bool, bool) = sqlx::query_as(
        "SELECT confirmed, unsubscribed_at IS NOT NULL FROM subscribers WHERE email = 'a@b.com'",
    )
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();

    assert_ne!(first_token, second_token);
    assert!(!unsubscribed);
    assert!(!confirmed);
    assert_eq!(test_app.get_confirm(&first_token).await.status(), 404);
    assert_eq!(test_app.get_confirm(&second_token).await.status(), 200);
}
