use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_language::SubscriberLanguage;
use crate::domain::subscriber_status::SubscriberStatus;

/// Anonymous opt-in record as stored in the `subscribers` table.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub language: SubscriberLanguage,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirm_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub unsubscribe_token: String,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub consented_at: Option<DateTime<Utc>>,
    pub consent_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn status(&self) -> SubscriberStatus {
        SubscriberStatus::from_flags(self.confirmed, self.unsubscribed_at)
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for Subscriber {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let email: String = row.try_get("email")?;
        let language: String = row.try_get("language")?;

        Ok(Subscriber {
            id: row.try_get("id")?,
            email: SubscriberEmail::parse(email).map_err(decode_error)?,
            language: SubscriberLanguage::parse(language).map_err(decode_error)?,
            confirmed: row.try_get("confirmed")?,
            confirmed_at: row.try_get("confirmed_at")?,
            confirm_token: row.try_get("confirm_token")?,
            token_expires_at: row.try_get("token_expires_at")?,
            unsubscribe_token: row.try_get("unsubscribe_token")?,
            unsubscribed_at: row.try_get("unsubscribed_at")?,
            consented_at: row.try_get("consented_at")?,
            consent_ip: row.try_get("consent_ip")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub(crate) fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}
