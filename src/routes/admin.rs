use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::authentication::AdminAccess;
use crate::errors::NewsletterError;
use crate::store::{accounts, subscribers};
use crate::suppression::SendSuppressionGate;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberStats {
    pending: i64,
    active: i64,
    inactive: i64,
    accounts_subscribed: i64,
}

/// Called after the suppression settings are edited so the change applies
/// without waiting for the cache to expire.
#[tracing::instrument(name = "Invalidate the suppression cache handler", skip(_admin, gate))]
pub async fn invalidate_suppression_cache(
    _admin: AdminAccess,
    gate: web::Data<SendSuppressionGate>,
) -> HttpResponse {
    gate.invalidate().await;

    HttpResponse::NoContent().finish()
}

#[tracing::instrument(name = "Subscriber stats handler", skip(_admin, db_pool))]
pub async fn subscriber_stats(
    _admin: AdminAccess,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, NewsletterError> {
    let counts = subscribers::count_by_status(db_pool.get_ref()).await?;
    let accounts_subscribed = accounts::count_newsletter_recipients(db_pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(SubscriberStats {
        pending: counts.pending,
        active: counts.active,
        inactive: counts.inactive,
        accounts_subscribed,
    }))
}
