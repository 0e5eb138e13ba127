//! Persistence for the two person records: anonymous subscribers, owned by
//! this service, and the newsletter columns of identity-owned accounts.

use crate::domain::token::TokenError;

pub mod accounts;
pub mod subscribers;

/// Failure of a token-authorized transition.
#[derive(thiserror::Error, Debug)]
pub enum TokenTransitionError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("Failed to apply the token transition.")]
    Database(#[from] sqlx::Error),
}
