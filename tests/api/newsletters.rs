use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

fn newsletter_body() -> serde_json::Value {
    serde_json::json!({
      "title": "Newsletter title",
      "content": {
        "html": "<p>Newsletter content</p>"
      }
    })
}

async fn create_unconfirmed_subscriber(test_app: &TestApp, email: &str) {
    // When executing a mock with the method mount_as_scoped, the mock will stop to listen the /mail/send endpoint when it goes out of scope (so, when the execution of create_unconfirmed_subscriber
    // ends).
    let _mock_guard = Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .named("Create unconfirmed subscriber")
        .expect(1)
        .mount_as_scoped(&test_app.email_server)
        .await;

    test_app.subscribe(email).await;
}

async fn create_confirmed_subscriber(test_app: &TestApp, email: &str) {
    create_unconfirmed_subscriber(test_app, email).await;

    let token = test_app.last_confirmation_token().await;

    test_app.get_confirm(&token).await.error_for_status().unwrap();
}

#[tokio::test]
async fn newsletters_are_not_delivered_to_unconfirmed_subscribers() {
    let test_app = TestApp::spawn_app().await;

    create_unconfirmed_subscriber(&test_app, "pending@test.com").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_newsletter(newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn newsletters_are_delivered_to_confirmed_subscribers() {
    let test_app = TestApp::spawn_app().await;

    create_confirmed_subscriber(&test_app, "active@test.com").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_newsletter(newsletter_body()).await;
    assert_eq!(response.status().as_u16(), 200);

    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report, serde_json::json!({ "recipients": 1, "sent": 1, "failed": 0 }));
}

#[tokio::test]
async fn newsletters_are_not_delivered_to_unsubscribed_subscribers() {
    let test_app = TestApp::spawn_app().await;

    create_confirmed_subscriber(&test_app, "gone@test.com").await;
    test_app
        .get_unsubscribe(&test_app.unsubscribe_token_of("gone@test.com").await)
        .await
        .error_for_status()
        .unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_newsletter(newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn opted_in_accounts_receive_the_newsletter_once() {
    let test_app = TestApp::spawn_app().await;

    test_app.insert_account("both@test.com", false).await;
    test_app
        .post_user_newsletter_as("both@test.com", true)
        .await
        .error_for_status()
        .unwrap();
    create_confirmed_subscriber(&test_app, "both@test.com").await;

    test_app.insert_account("account-only@test.com", false).await;
    test_app
        .post_user_newsletter_as("account-only@test.com", true)
        .await
        .error_for_status()
        .unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&test_app.email_server)
        .await;

    let report: serde_json::Value = test_app
        .post_newsletter(newsletter_body())
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(report["recipients"], 2);
}

#[tokio::test]
async fn failed_deliveries_are_reported() {
    let test_app = TestApp::spawn_app().await;

    create_confirmed_subscriber(&test_app, "active@test.com").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_newsletter(newsletter_body()).await;
    assert_eq!(response.status().as_u16(), 200);

    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report, serde_json::json!({ "recipients": 1, "sent": 0, "failed": 1 }));
}

#[tokio::test]
async fn newsletters_returns_400_when_body_is_invalid() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({
              "content": {
                "html": "<p>Newsletter content</p>"
              }
            }),
            "missing title",
        ),
        (
            serde_json::json!({
                "title": "Newsletter title",
            }),
            "missing content",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_newsletter(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn newsletters_require_the_admin_token() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/newsletters", test_app.address))
        .bearer_auth("wrong-token")
        .json(&newsletter_body())
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 401);
}
