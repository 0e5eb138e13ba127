use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::domain::subscriber_status::SubscriberStatus;

const TOKEN_LENGTH: usize = 32;
const LOGGED_TOKEN_PREFIX: usize = 4;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("The token does not match any live subscription.")]
    InvalidToken,
    #[error("The confirmation token has expired.")]
    Expired,
}

/// A freshly issued confirmation token together with the instant it stops
/// being accepted.
#[derive(Debug, Clone)]
pub struct ConfirmToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of validating a confirm token that matched a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Transition,
    AlreadyConfirmed,
}

/// Outcome of validating an unsubscribe token that matched a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeDecision {
    Transition,
    AlreadyUnsubscribed,
}

impl ConfirmToken {
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> ConfirmToken {
        ConfirmToken {
            value: generate_token(),
            expires_at: now + ttl,
        }
    }
}

/// Opaque alphanumeric token drawn from the thread-local CSPRNG.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();

    std::iter::repeat_with(|| rng.sample(rand::distributions::Alphanumeric))
        .map(char::from)
        .take(TOKEN_LENGTH)
        .collect()
}

/// A token is accepted up to and including its expiry instant.
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(expires_at) => now > expires_at,
        None => true,
    }
}

/// Classifies a confirm token lookup. `matched` carries the state and expiry of
/// the row whose current confirm token equals the submitted one, if any.
pub fn classify_confirm(
    matched: Option<(SubscriberStatus, Option<DateTime<Utc>>)>,
    now: DateTime<Utc>,
) -> Result<ConfirmDecision, TokenError> {
    let (status, expires_at) = matched.ok_or(TokenError::InvalidToken)?;

    if is_expired(expires_at, now) {
        return Err(TokenError::Expired);
    }

    if status.is_active() {
        return Ok(ConfirmDecision::AlreadyConfirmed);
    }

    Ok(ConfirmDecision::Transition)
}

/// Unsubscribe tokens never expire; rotation is what retires them.
pub fn classify_unsubscribe(
    matched: Option<SubscriberStatus>,
) -> Result<UnsubscribeDecision, TokenError> {
    match matched {
        None => Err(TokenError::InvalidToken),
        Some(SubscriberStatus::Inactive) => Ok(UnsubscribeDecision::AlreadyUnsubscribed),
        Some(_) => Ok(UnsubscribeDecision::Transition),
    }
}

/// Shortened form safe to attach to log records.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(LOGGED_TOKEN_PREFIX).collect();

    format!("{}…", prefix)
}
