use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{
    consent::{ConsentPolicy, ConsentRecord},
    new_subscriber::NewSubscriber,
    subscriber::Subscriber,
    subscriber_email::SubscriberEmail,
    subscriber_language::SubscriberLanguage,
    token::{
        classify_confirm, classify_unsubscribe, generate_token, redact, ConfirmDecision,
        ConfirmToken, TokenError, UnsubscribeDecision,
    },
};
use crate::store::TokenTransitionError;

/// Result of a subscribe request against the store.
#[derive(Debug)]
pub enum SubscribeOutcome {
    Created(Subscriber),
    Regenerated(Subscriber),
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed(SubscriberLanguage),
    AlreadyConfirmed(SubscriberLanguage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed(SubscriberLanguage),
    AlreadyUnsubscribed(SubscriberLanguage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SubscriberCounts {
    pub pending: i64,
    pub active: i64,
    pub inactive: i64,
}

/// Creates a PENDING subscriber, or moves an existing PENDING/INACTIVE one
/// back to PENDING with a fresh confirm token. ACTIVE rows are left untouched.
/// A returning subscriber has to confirm again even if it was confirmed
/// before, so `confirmed` is reset on that path.
///
/// Concurrent requests for an unseen email race on the unique `email`
/// constraint: the losing insert becomes a no-op and falls through to the
/// update path.
#[tracing::instrument(
    name = "Store a pending subscriber",
    skip(db_pool, new_subscriber, token, consent),
    fields(subscriber_email = %new_subscriber.email)
)]
pub async fn store_pending(
    db_pool: &PgPool,
    new_subscriber: &NewSubscriber,
    token: &ConfirmToken,
    consent: &ConsentRecord,
    consent_policy: ConsentPolicy,
) -> Result<SubscribeOutcome, sqlx::Error> {
    let created = sqlx::query_as::<_, Subscriber>(
        r#"
        INSERT INTO subscribers (
            id, email, language, confirmed, confirm_token, token_expires_at,
            unsubscribe_token, consented_at, consent_ip, created_at
        )
        VALUES ($1, $2, $3, FALSE, $4, $5, $6, $7, $8, $7)
        ON CONFLICT (email) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.language.as_ref())
    .bind(&token.value)
    .bind(token.expires_at)
    .bind(generate_token())
    .bind(consent.consented_at)
    .bind(&consent.consent_ip)
    .fetch_optional(db_pool)
    .await?;

    if let Some(subscriber) = created {
        return Ok(SubscribeOutcome::Created(subscriber));
    }

    let regenerated = sqlx::query_as::<_, Subscriber>(
        r#"
        UPDATE subscribers
        SET confirm_token = $2,
            token_expires_at = $3,
            language = $4,
            confirmed = FALSE,
            unsubscribed_at = NULL,
            consented_at = CASE WHEN $5 THEN $6 ELSE consented_at END,
            consent_ip = CASE WHEN $5 THEN $7 ELSE consent_ip END
        WHERE email = $1 AND NOT (confirmed AND unsubscribed_at IS NULL)
        RETURNING *
        "#,
    )
    .bind(new_subscriber.email.as_ref())
    .bind(&token.value)
    .bind(token.expires_at)
    .bind(new_subscriber.language.as_ref())
    .bind(consent_policy.refreshes_on_resubscribe())
    .bind(consent.consented_at)
    .bind(&consent.consent_ip)
    .fetch_optional(db_pool)
    .await?;

    Ok(match regenerated {
        Some(subscriber) => SubscribeOutcome::Regenerated(subscriber),
        None => SubscribeOutcome::AlreadyActive,
    })
}

/// Consumes a confirm token. Validation, rotation and the state change are a
/// single conditional update keyed on the token's current value, so a token
/// can authorize at most one transition.
///
/// Following the link is the opt-in itself, so the consent record is
/// overwritten with the confirming request's.
#[tracing::instrument(
    name = "Confirm a subscriber by token",
    skip(db_pool, token, consent),
    fields(token = %redact(token))
)]
pub async fn confirm_by_token(
    db_pool: &PgPool,
    token: &str,
    consent: &ConsentRecord,
) -> Result<ConfirmOutcome, TokenTransitionError> {
    let now = consent.consented_at;
    let confirmed = sqlx::query_as::<_, Subscriber>(
        r#"
        UPDATE subscribers
        SET confirmed = TRUE,
            confirmed_at = $2,
            unsubscribed_at = NULL,
            confirm_token = $3,
            token_expires_at = to_timestamp(0),
            consented_at = $2,
            consent_ip = $4
        WHERE confirm_token = $1
          AND token_expires_at >= $2
          AND NOT (confirmed AND unsubscribed_at IS NULL)
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(now)
    .bind(generate_token())
    .bind(&consent.consent_ip)
    .fetch_optional(db_pool)
    .await?;

    if let Some(subscriber) = confirmed {
        return Ok(ConfirmOutcome::Confirmed(subscriber.language));
    }

    let matched = find_by_confirm_token(db_pool, token).await?;
    let decision = classify_confirm(
        matched
            .as_ref()
            .map(|subscriber| (subscriber.status(), subscriber.token_expires_at)),
        now,
    )?;

    match (decision, matched) {
        (ConfirmDecision::AlreadyConfirmed, Some(subscriber)) => {
            Ok(ConfirmOutcome::AlreadyConfirmed(subscriber.language))
        }
        // The token was rotated by a concurrent request between both queries
        _ => Err(TokenError::InvalidToken.into()),
    }
}

/// Consumes an unsubscribe token, rotating it in the same write.
#[tracing::instrument(
    name = "Unsubscribe a subscriber by token",
    skip(db_pool, token),
    fields(token = %redact(token))
)]
pub async fn unsubscribe_by_token(
    db_pool: &PgPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<UnsubscribeOutcome, TokenTransitionError> {
    let unsubscribed = sqlx::query_as::<_, Subscriber>(
        r#"
        UPDATE subscribers
        SET unsubscribed_at = $2,
            unsubscribe_token = $3
        WHERE unsubscribe_token = $1 AND unsubscribed_at IS NULL
        RETURNING *
        "#,
    )
    .bind(token)
    .bind(now)
    .bind(generate_token())
    .fetch_optional(db_pool)
    .await?;

    if let Some(subscriber) = unsubscribed {
        return Ok(UnsubscribeOutcome::Unsubscribed(subscriber.language));
    }

    let matched = find_by_unsubscribe_token(db_pool, token).await?;
    let decision = classify_unsubscribe(matched.as_ref().map(Subscriber::status))?;

    match (decision, matched) {
        (UnsubscribeDecision::AlreadyUnsubscribed, Some(subscriber)) => {
            Ok(UnsubscribeOutcome::AlreadyUnsubscribed(subscriber.language))
        }
        _ => Err(TokenError::InvalidToken.into()),
    }
}

/// Moves the subscriber sharing `email` straight to ACTIVE. Only the
/// authenticated preference path may skip the token round-trip.
#[tracing::instrument(name = "Activate a subscriber by email", skip(executor))]
pub async fn activate_by_email(
    executor: impl PgExecutor<'_>,
    email: &SubscriberEmail,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE subscribers
        SET confirmed = TRUE,
            confirmed_at = $2,
            consented_at = $2,
            unsubscribed_at = NULL
        WHERE email = $1
        "#,
    )
    .bind(email.as_ref())
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Moves the subscriber sharing `email` to INACTIVE and retires its
/// unsubscribe token. Already inactive rows are left as they are.
#[tracing::instrument(name = "Deactivate a subscriber by email", skip(executor))]
pub async fn deactivate_by_email(
    executor: impl PgExecutor<'_>,
    email: &SubscriberEmail,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE subscribers
        SET unsubscribed_at = $2,
            unsubscribe_token = $3
        WHERE email = $1 AND unsubscribed_at IS NULL
        "#,
    )
    .bind(email.as_ref())
    .bind(now)
    .bind(generate_token())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn find_by_confirm_token(
    executor: impl PgExecutor<'_>,
    token: &str,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE confirm_token = $1")
        .bind(token)
        .fetch_optional(executor)
        .await
}

async fn find_by_unsubscribe_token(
    executor: impl PgExecutor<'_>,
    token: &str,
) -> Result<Option<Subscriber>, sqlx::Error> {
    sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE unsubscribe_token = $1")
        .bind(token)
        .fetch_optional(executor)
        .await
}

#[tracing::instrument(name = "Fetch active subscriber emails", skip(executor))]
pub async fn active_emails(
    executor: impl PgExecutor<'_>,
) -> Result<Vec<SubscriberEmail>, sqlx::Error> {
    let emails: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT email
        FROM subscribers
        WHERE confirmed AND unsubscribed_at IS NULL
        "#,
    )
    .fetch_all(executor)
    .await?;

    let mut valid_emails = Vec::with_capacity(emails.len());
    for email in emails {
        match SubscriberEmail::parse(email) {
            Ok(email) => valid_emails.push(email),
            Err(err) => tracing::warn!("Skipping a stored subscriber: {}", err),
        }
    }

    Ok(valid_emails)
}

#[tracing::instrument(name = "Count subscribers by state", skip(executor))]
pub async fn count_by_status(
    executor: impl PgExecutor<'_>,
) -> Result<SubscriberCounts, sqlx::Error> {
    sqlx::query_as::<_, SubscriberCounts>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE unsubscribed_at IS NULL AND NOT confirmed) AS pending,
            COUNT(*) FILTER (WHERE unsubscribed_at IS NULL AND confirmed) AS active,
            COUNT(*) FILTER (WHERE unsubscribed_at IS NOT NULL) AS inactive
        FROM subscribers
        "#,
    )
    .fetch_one(executor)
    .await
}
