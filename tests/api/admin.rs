use crate::helpers::TestApp;

#[tokio::test]
async fn stats_count_subscribers_by_state() {
    let test_app = TestApp::spawn_app().await;
    test_app.mount_email_server().await;

    test_app.subscribe("pending@test.com").await;
    test_app.create_active_subscriber("active@test.com").await;
    test_app.create_active_subscriber("gone@test.com").await;
    test_app
        .get_unsubscribe(&test_app.unsubscribe_token_of("gone@test.com").await)
        .await
        .error_for_status()
        .unwrap();
    test_app.insert_account("account@test.com", false).await;
    test_app
        .post_user_newsletter_as("account@test.com", true)
        .await
        .error_for_status()
        .unwrap();

    let response = test_app.get_stats().await;
    assert_eq!(response.status().as_u16(), 200);

    let stats: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        stats,
        serde_json::json!({
            "pending": 1,
            "active": 1,
            "inactive": 1,
            "accountsSubscribed": 1
        })
    );
}

#[tokio::test]
async fn stats_require_the_admin_token() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/admin/subscribers/stats", test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 401);
}
