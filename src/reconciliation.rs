//! Account reconciliation.
//!
//! An account carries a mirror of the newsletter preference for in-app
//! display, while the subscriber row decides outbound sends. The two records
//! share a normalized email and either may be missing. This is the only code
//! path that writes both of them, and it does so in one transaction.
//!
//! The public unsubscribe link deliberately does not come through here: it
//! only moves the subscriber row, and the account flag keeps its value.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::account::Account;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::store::{accounts, subscribers};

#[derive(Debug)]
pub struct ReconciliationOutcome {
    /// The account after the update.
    pub account: Account,
    /// Whether a subscriber row changed state.
    pub subscriber_transitioned: bool,
}

/// Applies an authenticated opt-in (`subscribed = true`) or opt-out to both
/// records.
///
/// Opting in moves an existing subscriber straight to ACTIVE without a token
/// round-trip, since authentication already proves control of the address.
/// Opting out moves it to INACTIVE and retires its unsubscribe token.
///
/// Returns `None`, with nothing written, when no account exists for `email`.
#[tracing::instrument(name = "Reconcile the newsletter preference", skip(db_pool))]
pub async fn apply_preference(
    db_pool: &PgPool,
    email: &SubscriberEmail,
    subscribed: bool,
    now: DateTime<Utc>,
) -> Result<Option<ReconciliationOutcome>, sqlx::Error> {
    let mut transaction = db_pool.begin().await?;

    let confirmed_at = if subscribed { Some(now) } else { None };
    let account =
        match accounts::set_newsletter_preference(&mut transaction, email, subscribed, confirmed_at)
            .await?
        {
            Some(account) => account,
            None => {
                transaction.rollback().await?;
                tracing::warn!("No account for the email, preference left untouched");
                return Ok(None);
            }
        };

    let subscriber_transitioned = if subscribed {
        subscribers::activate_by_email(&mut transaction, email, now).await?
    } else {
        subscribers::deactivate_by_email(&mut transaction, email, now).await?
    };

    transaction.commit().await?;

    tracing::info!(subscriber_transitioned, "Newsletter preference reconciled");

    Ok(Some(ReconciliationOutcome {
        account,
        subscriber_transitioned,
    }))
}
