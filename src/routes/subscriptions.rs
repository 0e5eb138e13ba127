use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::{
    domain::{
        consent::ConsentRecord,
        new_subscriber::{NewSubscriber, NewSubscriberBody},
        token::ConfirmToken,
    },
    email_client::EmailClient,
    errors::NewsletterError,
    notifications::send_confirmation_email,
    startup::{ApplicationBaseUrl, LifecycleSettings},
    store::subscribers::{self, SubscribeOutcome},
    suppression::SendSuppressionGate,
};

const GENERIC_SUBSCRIBE_MESSAGE: &str =
    "If this email exists, you will receive a confirmation email.";

#[derive(serde::Serialize)]
pub struct SubscribeResponse {
    success: bool,
    message: &'static str,
}

impl SubscribeResponse {
    /// The same body for every outcome, so the endpoint cannot be used to
    /// find out which emails are registered.
    fn generic() -> Self {
        SubscribeResponse {
            success: true,
            message: GENERIC_SUBSCRIBE_MESSAGE,
        }
    }
}

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(body, request, db_pool, email_client, gate, base_url, lifecycle),
    fields(
        subscriber_email = %body.email,
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<NewSubscriberBody>,
    request: HttpRequest,
    db_pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    gate: web::Data<SendSuppressionGate>,
    base_url: web::Data<ApplicationBaseUrl>,
    lifecycle: web::Data<LifecycleSettings>,
) -> Result<HttpResponse, NewsletterError> {
    let new_subscriber: NewSubscriber = body.try_into().map_err(|err: String| {
        tracing::error!("Validation error: {:?}", err);
        NewsletterError::Validation(err)
    })?;

    let now = Utc::now();
    let token = ConfirmToken::issue(now, lifecycle.confirm_token_ttl);
    let consent = ConsentRecord::capture(&request, now);

    let outcome = subscribers::store_pending(
        &db_pool,
        &new_subscriber,
        &token,
        &consent,
        lifecycle.consent_policy,
    )
    .await
    .map_err(|err| {
        tracing::error!("Failed to store the subscriber: {:?}", err);
        err
    })?;

    match outcome {
        SubscribeOutcome::Created(subscriber) | SubscribeOutcome::Regenerated(subscriber) => {
            send_confirmation_email(&email_client, &gate, &subscriber, &base_url.0).await;
        }
        SubscribeOutcome::AlreadyActive => {
            tracing::info!("Subscriber is already active, nothing to do");
        }
    }

    Ok(HttpResponse::Ok().json(SubscribeResponse::generic()))
}
