use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The slice of an identity-owned user record this service reads and writes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub newsletter_subscribed: bool,
    pub newsletter_confirmed_at: Option<DateTime<Utc>>,
    pub is_test_user: bool,
}

/// In-app newsletter preference mirrored on the account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterPreference {
    pub subscribed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn preference(&self) -> NewsletterPreference {
        NewsletterPreference {
            subscribed: self.newsletter_subscribed,
            confirmed_at: self.newsletter_confirmed_at,
        }
    }
}
