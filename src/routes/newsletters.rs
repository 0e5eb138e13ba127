use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::authentication::AdminAccess;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::errors::NewsletterError;
use crate::store::{accounts, subscribers};
use crate::suppression::SendSuppressionGate;

#[derive(Deserialize, Debug)]
pub struct NewNewsletter {
    pub title: String,
    pub content: NewsletterContent,
}

#[derive(Deserialize, Debug)]
pub struct NewsletterContent {
    pub html: String,
}

#[derive(serde::Serialize, Debug, PartialEq, Eq)]
pub struct PublishReport {
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

#[tracing::instrument(
    name = "Publishing a newsletter to all subscribers",
    skip(_admin, body, db_pool, email_client, gate),
    fields(
        title = %body.title,
    )
)]
pub async fn publish_newsletter(
    _admin: AdminAccess,
    body: web::Json<NewNewsletter>,
    db_pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    gate: web::Data<SendSuppressionGate>,
) -> Result<HttpResponse, NewsletterError> {
    let recipients = get_recipients(&db_pool, &gate).await?;
    let mut report = PublishReport {
        recipients: recipients.len(),
        sent: 0,
        failed: 0,
    };

    // No queue and no retries: a failed delivery is logged and skipped
    for recipient in &recipients {
        match email_client
            .send_email(recipient, &body.title, &body.content.html)
            .await
        {
            Ok(()) => report.sent += 1,
            Err(err) => {
                tracing::error!("Failed to deliver the newsletter to {}: {:?}", recipient, err);
                report.failed += 1;
            }
        }
    }

    Ok(HttpResponse::Ok().json(report))
}

/// ACTIVE subscribers and confirmed accounts that the suppression gate lets
/// through, without duplicates.
#[tracing::instrument(name = "Collect newsletter recipients", skip(db_pool, gate))]
pub async fn get_recipients(
    db_pool: &PgPool,
    gate: &SendSuppressionGate,
) -> Result<Vec<SubscriberEmail>, sqlx::Error> {
    let subscriber_emails = subscribers::active_emails(db_pool).await?;
    let mut recipients = gate.filter_emails(subscriber_emails).await?;

    let recipient_accounts = accounts::newsletter_recipients(db_pool).await?;
    let account_ids: Vec<Uuid> = recipient_accounts.iter().map(|account| account.id).collect();
    let permitted: HashSet<Uuid> = gate
        .filter_accounts(&account_ids)
        .await?
        .into_iter()
        .collect();

    for account in recipient_accounts
        .into_iter()
        .filter(|account| permitted.contains(&account.id))
    {
        match SubscriberEmail::parse(account.email) {
            Ok(email) => recipients.push(email),
            Err(err) => tracing::warn!("Skipping an account with an invalid email: {}", err),
        }
    }

    let mut seen = HashSet::new();
    recipients.retain(|email| seen.insert(email.clone()));

    Ok(recipients)
}
