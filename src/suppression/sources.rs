use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time;

use super::{SuppressionConfig, SuppressionConfigSource, SuppressionSourceError};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(5);
const PAUSED_KEY: &str = "newsletter:paused";
const TEST_EMAILS_KEY: &str = "newsletter:test_emails";

/// Reads the site settings document published by the CMS.
pub struct HttpSuppressionSource {
    http_client: Client,
    url: String,
}

/// Reads the switch and the allowlist from Redis.
pub struct RedisSuppressionSource {
    redis_client: redis::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteSettingsDocument {
    newsletter_paused: Option<bool>,
    test_emails: Option<Vec<TestEmailEntry>>,
}

#[derive(Deserialize)]
struct TestEmailEntry {
    email: String,
}

impl HttpSuppressionSource {
    pub fn new(url: String) -> Result<HttpSuppressionSource, reqwest::Error> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(HttpSuppressionSource { http_client, url })
    }
}

#[async_trait]
impl SuppressionConfigSource for HttpSuppressionSource {
    #[tracing::instrument(name = "Fetch suppression settings from the CMS", skip(self))]
    async fn fetch(&self) -> Result<SuppressionConfig, SuppressionSourceError> {
        let document: Option<SiteSettingsDocument> = self
            .http_client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // No settings document published yet means sends stay paused
        let config = match document {
            Some(document) => SuppressionConfig::new(
                document.newsletter_paused.unwrap_or(true),
                document
                    .test_emails
                    .unwrap_or_default()
                    .into_iter()
                    .map(|entry| entry.email),
            ),
            None => SuppressionConfig::fail_closed(),
        };

        Ok(config)
    }
}

impl RedisSuppressionSource {
    pub fn new(redis_client: redis::Client) -> RedisSuppressionSource {
        RedisSuppressionSource { redis_client }
    }
}

#[async_trait]
impl SuppressionConfigSource for RedisSuppressionSource {
    #[tracing::instrument(name = "Fetch suppression settings from Redis", skip(self))]
    async fn fetch(&self) -> Result<SuppressionConfig, SuppressionSourceError> {
        let mut redis_conn = self.redis_client.get_tokio_connection().await?;

        let paused: Option<String> = redis::cmd("GET")
            .arg(PAUSED_KEY)
            .query_async(&mut redis_conn)
            .await?;
        let test_emails: Vec<String> = redis::cmd("SMEMBERS")
            .arg(TEST_EMAILS_KEY)
            .query_async(&mut redis_conn)
            .await?;

        Ok(SuppressionConfig::new(
            parse_paused_flag(paused.as_deref()),
            test_emails,
        ))
    }
}

/// A missing flag keeps sends paused.
fn parse_paused_flag(value: Option<&str>) -> bool {
    match value {
        Some(value) => matches!(value.trim().to_lowercase().as_str(), "true" | "1"),
        None => true,
    }
}
