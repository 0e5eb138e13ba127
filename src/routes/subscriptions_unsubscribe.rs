use actix_web::{
    web::{self, Query},
    HttpResponse,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::authentication::AuthenticatedUser;
use crate::domain::subscriber_language::SubscriberLanguage;
use crate::domain::token::redact;
use crate::errors::NewsletterError;
use crate::reconciliation::apply_preference;
use crate::store::subscribers::{self, UnsubscribeOutcome};

#[derive(Deserialize, Debug)]
pub struct Parameters {
    pub token: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeByTokenResponse {
    success: bool,
    already_unsubscribed: bool,
    language: SubscriberLanguage,
}

#[derive(serde::Serialize)]
pub struct UnsubscribeResponse {
    success: bool,
}

/// One-click unsubscribe from an email link. Only the subscriber row changes;
/// a linked account keeps its newsletter flag.
#[tracing::instrument(
  name = "Unsubscribe from the newsletter by token",
  skip(db_pool, parameters),
  fields(
    token = %redact(&parameters.token),
  )
)]
pub async fn handle_unsubscribe_by_token(
    db_pool: web::Data<PgPool>,
    parameters: Query<Parameters>,
) -> Result<HttpResponse, NewsletterError> {
    let outcome =
        subscribers::unsubscribe_by_token(&db_pool, &parameters.token, Utc::now()).await?;

    let response = match outcome {
        UnsubscribeOutcome::Unsubscribed(language) => UnsubscribeByTokenResponse {
            success: true,
            already_unsubscribed: false,
            language,
        },
        UnsubscribeOutcome::AlreadyUnsubscribed(language) => UnsubscribeByTokenResponse {
            success: true,
            already_unsubscribed: true,
            language,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Unsubscribe from the account profile. Both records are updated.
#[tracing::instrument(
  name = "Unsubscribe an authenticated account from the newsletter",
  skip(db_pool, user),
  fields(
    account_email = %user.email,
  )
)]
pub async fn handle_unsubscribe_authenticated(
    user: AuthenticatedUser,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    apply_preference(&db_pool, &user.email, false, Utc::now())
        .await?
        .ok_or(NewsletterError::AccountNotFound)?;

    Ok(HttpResponse::Ok().json(UnsubscribeResponse { success: true }))
}
