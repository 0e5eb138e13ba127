use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::authentication::AuthenticatedUser;
use crate::errors::NewsletterError;
use crate::reconciliation::apply_preference;
use crate::store::accounts;

#[derive(Deserialize, Debug)]
pub struct PreferenceBody {
    pub subscribed: bool,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdatedResponse {
    success: bool,
    subscribed: bool,
    confirmed_at: Option<DateTime<Utc>>,
}

#[tracing::instrument(
    name = "Get the newsletter preference",
    skip(db_pool, user),
    fields(account_email = %user.email)
)]
pub async fn handle_get_preference(
    user: AuthenticatedUser,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let account = accounts::find_by_email(db_pool.get_ref(), &user.email)
        .await?
        .ok_or(NewsletterError::AccountNotFound)?;

    Ok(HttpResponse::Ok().json(account.preference()))
}

#[tracing::instrument(
    name = "Set the newsletter preference",
    skip(db_pool, user, body),
    fields(
        account_email = %user.email,
        subscribed = %body.subscribed
    )
)]
pub async fn handle_set_preference(
    user: AuthenticatedUser,
    body: web::Json<PreferenceBody>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let outcome = apply_preference(&db_pool, &user.email, body.subscribed, Utc::now())
        .await?
        .ok_or(NewsletterError::AccountNotFound)?;
    let preference = outcome.account.preference();

    Ok(HttpResponse::Ok().json(PreferenceUpdatedResponse {
        success: true,
        subscribed: preference.subscribed,
        confirmed_at: preference.confirmed_at,
    }))
}
