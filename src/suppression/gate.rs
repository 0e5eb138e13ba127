use std::collections::HashSet;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use super::SuppressionCache;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::store::accounts;

/// Decides whether a recipient may currently receive mail.
///
/// Sends are allowed when the newsletter is not paused. While paused, only
/// accounts flagged as test users and allowlisted emails get through.
#[derive(Clone)]
pub struct SendSuppressionGate {
    cache: Arc<SuppressionCache>,
    db_pool: PgPool,
}

impl SendSuppressionGate {
    pub fn new(cache: Arc<SuppressionCache>, db_pool: PgPool) -> SendSuppressionGate {
        SendSuppressionGate { cache, db_pool }
    }

    #[tracing::instrument(name = "Check if an email may receive mail", skip(self))]
    pub async fn can_send_to_email(&self, email: &SubscriberEmail) -> Result<bool, sqlx::Error> {
        let config = self.cache.get().await;

        if !config.newsletter_paused || config.is_allowlisted(email.as_ref()) {
            return Ok(true);
        }

        let account = accounts::find_by_email(&self.db_pool, email).await?;

        Ok(account.map_or(false, |account| account.is_test_user))
    }

    #[tracing::instrument(name = "Check if an account may receive mail", skip(self))]
    pub async fn can_send_to_account(&self, account_id: Uuid) -> Result<bool, sqlx::Error> {
        let config = self.cache.get().await;

        if !config.newsletter_paused {
            return Ok(true);
        }

        let account = accounts::find_by_id(&self.db_pool, account_id).await?;

        Ok(account.map_or(false, |account| {
            config.permits(&account.email, account.is_test_user)
        }))
    }

    /// Keeps the accounts currently allowed to receive mail, in input order.
    #[tracing::instrument(
        name = "Filter accounts allowed to receive mail",
        skip(self, account_ids),
        fields(candidates = account_ids.len())
    )]
    pub async fn filter_accounts(&self, account_ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        let config = self.cache.get().await;

        if !config.newsletter_paused {
            return Ok(account_ids.to_vec());
        }

        let permitted: HashSet<Uuid> = accounts::find_by_ids(&self.db_pool, account_ids)
            .await?
            .into_iter()
            .filter(|account| config.permits(&account.email, account.is_test_user))
            .map(|account| account.id)
            .collect();

        Ok(account_ids
            .iter()
            .filter(|id| permitted.contains(id))
            .copied()
            .collect())
    }

    /// Keeps the emails currently allowed to receive mail, in input order.
    #[tracing::instrument(
        name = "Filter emails allowed to receive mail",
        skip(self, emails),
        fields(candidates = emails.len())
    )]
    pub async fn filter_emails(
        &self,
        emails: Vec<SubscriberEmail>,
    ) -> Result<Vec<SubscriberEmail>, sqlx::Error> {
        let config = self.cache.get().await;

        if !config.newsletter_paused {
            return Ok(emails);
        }

        let candidates: Vec<String> = emails.iter().map(|email| email.to_string()).collect();
        let test_users: HashSet<String> =
            accounts::find_test_accounts_by_emails(&self.db_pool, &candidates)
                .await?
                .into_iter()
                .map(|account| account.email.to_lowercase())
                .collect();

        Ok(emails
            .into_iter()
            .filter(|email| config.permits(email.as_ref(), test_users.contains(email.as_ref())))
            .collect())
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await
    }
}
