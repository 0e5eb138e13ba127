use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::{account::Account, subscriber_email::SubscriberEmail};

// Account emails are owned by the identity subsystem, so lookups normalize on
// the stored side too.

#[tracing::instrument(name = "Find an account by email", skip(executor))]
pub async fn find_by_email(
    executor: impl PgExecutor<'_>,
    email: &SubscriberEmail,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, newsletter_subscribed, newsletter_confirmed_at, is_test_user
        FROM users
        WHERE lower(email) = $1
        "#,
    )
    .bind(email.as_ref())
    .fetch_optional(executor)
    .await
}

#[tracing::instrument(name = "Find an account by id", skip(executor))]
pub async fn find_by_id(
    executor: impl PgExecutor<'_>,
    account_id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, newsletter_subscribed, newsletter_confirmed_at, is_test_user
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(account_id)
    .fetch_optional(executor)
    .await
}

#[tracing::instrument(name = "Find accounts by id", skip(executor, account_ids))]
pub async fn find_by_ids(
    executor: impl PgExecutor<'_>,
    account_ids: &[Uuid],
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, newsletter_subscribed, newsletter_confirmed_at, is_test_user
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(account_ids)
    .fetch_all(executor)
    .await
}

#[tracing::instrument(name = "Find test accounts by email", skip(executor, emails))]
pub async fn find_test_accounts_by_emails(
    executor: impl PgExecutor<'_>,
    emails: &[String],
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, newsletter_subscribed, newsletter_confirmed_at, is_test_user
        FROM users
        WHERE is_test_user AND lower(email) = ANY($1)
        "#,
    )
    .bind(emails)
    .fetch_all(executor)
    .await
}

/// Writes the account's newsletter mirror. Returns `None` when no account
/// exists for the email.
#[tracing::instrument(name = "Update the account newsletter preference", skip(executor))]
pub async fn set_newsletter_preference(
    executor: impl PgExecutor<'_>,
    email: &SubscriberEmail,
    subscribed: bool,
    confirmed_at: Option<DateTime<Utc>>,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE users
        SET newsletter_subscribed = $2,
            newsletter_confirmed_at = $3
        WHERE lower(email) = $1
        RETURNING id, email, newsletter_subscribed, newsletter_confirmed_at, is_test_user
        "#,
    )
    .bind(email.as_ref())
    .bind(subscribed)
    .bind(confirmed_at)
    .fetch_optional(executor)
    .await
}

#[tracing::instrument(name = "Fetch accounts receiving the newsletter", skip(executor))]
pub async fn newsletter_recipients(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, newsletter_subscribed, newsletter_confirmed_at, is_test_user
        FROM users
        WHERE newsletter_subscribed AND newsletter_confirmed_at IS NOT NULL
        "#,
    )
    .fetch_all(executor)
    .await
}

#[tracing::instrument(name = "Count accounts receiving the newsletter", skip(executor))]
pub async fn count_newsletter_recipients(
    executor: impl PgExecutor<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM users
        WHERE newsletter_subscribed AND newsletter_confirmed_at IS NOT NULL
        "#,
    )
    .fetch_one(executor)
    .await
}
