//! Send-suppression gate.
//!
//! A pre-launch switch that blocks outbound mail for everybody except test
//! accounts and an explicit allowlist. The switch and allowlist live in an
//! external configuration source and are read through a TTL cache.

use std::collections::HashSet;

use async_trait::async_trait;

mod cache;
mod gate;
mod sources;

pub use cache::SuppressionCache;
pub use gate::SendSuppressionGate;
pub use sources::{HttpSuppressionSource, RedisSuppressionSource};

/// Externally supplied suppression settings. Allowlisted emails are stored
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionConfig {
    pub newsletter_paused: bool,
    pub test_emails: HashSet<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum SuppressionSourceError {
    #[error("Failed to fetch the suppression configuration over HTTP.")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read the suppression configuration from Redis.")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait SuppressionConfigSource: Send + Sync {
    async fn fetch(&self) -> Result<SuppressionConfig, SuppressionSourceError>;
}

impl SuppressionConfig {
    pub fn new<I, S>(newsletter_paused: bool, test_emails: I) -> SuppressionConfig
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SuppressionConfig {
            newsletter_paused,
            test_emails: test_emails
                .into_iter()
                .map(|email| email.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Used when the source is unreachable or holds no document.
    pub fn fail_closed() -> SuppressionConfig {
        SuppressionConfig {
            newsletter_paused: true,
            test_emails: HashSet::new(),
        }
    }

    pub fn is_allowlisted(&self, email: &str) -> bool {
        self.test_emails.contains(&email.to_lowercase())
    }

    pub fn permits(&self, email: &str, is_test_user: bool) -> bool {
        !self.newsletter_paused || is_test_user || self.is_allowlisted(email)
    }
}
