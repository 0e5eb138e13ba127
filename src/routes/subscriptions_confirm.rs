use actix_web::{
    web::{self, Query},
    HttpRequest, HttpResponse,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::consent::ConsentRecord;
use crate::domain::subscriber_language::SubscriberLanguage;
use crate::domain::token::redact;
use crate::errors::NewsletterError;
use crate::store::subscribers::{self, ConfirmOutcome};

#[derive(Deserialize, Debug)]
pub struct Parameters {
    pub token: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    success: bool,
    already_confirmed: bool,
    language: SubscriberLanguage,
}

#[tracing::instrument(
  name = "Confirm a newsletter subscription",
  skip(db_pool, parameters, request),
  fields(
    token = %redact(&parameters.token),
  )
)]
pub async fn handle_confirm_subscription(
    db_pool: web::Data<PgPool>,
    parameters: Query<Parameters>,
    request: HttpRequest,
) -> Result<HttpResponse, NewsletterError> {
    let consent = ConsentRecord::capture(&request, Utc::now());
    let outcome = subscribers::confirm_by_token(&db_pool, &parameters.token, &consent).await?;

    let response = match outcome {
        ConfirmOutcome::Confirmed(language) => ConfirmResponse {
            success: true,
            already_confirmed: false,
            language,
        },
        ConfirmOutcome::AlreadyConfirmed(language) => ConfirmResponse {
            success: true,
            already_confirmed: true,
            language,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}
