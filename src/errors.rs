use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};

use crate::domain::token::TokenError;
use crate::store::TokenTransitionError;

/// Failures surfaced by the request-facing lifecycle operations.
#[derive(thiserror::Error)]
pub enum NewsletterError {
    #[error("{0}")]
    Validation(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token has expired")]
    Expired,
    #[error("User not found")]
    AccountNotFound,
    #[error("Internal server error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl std::fmt::Debug for NewsletterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for NewsletterError {
    fn status_code(&self) -> StatusCode {
        match self {
            NewsletterError::Validation(_) => StatusCode::BAD_REQUEST,
            NewsletterError::Unauthorized => StatusCode::UNAUTHORIZED,
            NewsletterError::InvalidToken => StatusCode::NOT_FOUND,
            NewsletterError::Expired => StatusCode::GONE,
            NewsletterError::AccountNotFound => StatusCode::NOT_FOUND,
            NewsletterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<sqlx::Error> for NewsletterError {
    fn from(err: sqlx::Error) -> Self {
        NewsletterError::Internal(Box::new(err))
    }
}

impl From<TokenError> for NewsletterError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => NewsletterError::InvalidToken,
            TokenError::Expired => NewsletterError::Expired,
        }
    }
}

impl From<TokenTransitionError> for NewsletterError {
    fn from(err: TokenTransitionError) -> Self {
        match err {
            TokenTransitionError::Token(err) => err.into(),
            TokenTransitionError::Database(err) => err.into(),
        }
    }
}

/// Writes the error followed by every error in its source chain.
pub fn error_chain_fmt(
    err: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}", err)?;

    let mut current = err.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }

    Ok(())
}

/// Malformed JSON bodies answer with the same JSON error body as handlers.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _request| {
        tracing::warn!("Rejected request body: {}", err);
        NewsletterError::Validation(err.to_string()).into()
    })
}

/// Missing or malformed query parameters, e.g. a link without `token`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _request| {
        tracing::warn!("Rejected query string: {}", err);
        NewsletterError::Validation(err.to_string()).into()
    })
}
