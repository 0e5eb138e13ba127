use crate::domain::subscriber::Subscriber;
use crate::domain::token::redact;
use crate::email_client::EmailClient;
use crate::suppression::SendSuppressionGate;
use crate::templates::{TemplateKind, TemplateParams};

/// Sends the double opt-in email for a PENDING subscriber.
///
/// Never fails: the subscription is already committed, so suppressed,
/// undeliverable or errored sends are only logged.
#[tracing::instrument(
    name = "Send a confirmation email to a subscriber",
    skip(email_client, gate, subscriber, base_url),
    fields(subscriber_email = %subscriber.email)
)]
pub async fn send_confirmation_email(
    email_client: &EmailClient,
    gate: &SendSuppressionGate,
    subscriber: &Subscriber,
    base_url: &str,
) {
    match gate.can_send_to_email(&subscriber.email).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Newsletter sends are paused, confirmation email suppressed");
            return;
        }
        Err(err) => {
            tracing::error!("Failed to evaluate the send-suppression gate: {:?}", err);
            return;
        }
    }

    let Some(token) = subscriber.confirm_token.as_deref() else {
        tracing::error!("Pending subscriber has no confirm token");
        return;
    };

    let params = TemplateParams {
        action_url: confirmation_link(base_url, subscriber, token),
        language: subscriber.language,
    };

    if let Err(err) = email_client
        .send(&subscriber.email, TemplateKind::ConfirmSubscription, &params)
        .await
    {
        tracing::error!(
            "Failed to send a confirmation email with token {}: {:?}",
            redact(token),
            err
        );
    }
}

pub fn confirmation_link(base_url: &str, subscriber: &Subscriber, token: &str) -> String {
    format!(
        "{}/{}/newsletter/confirm?token={}",
        base_url,
        subscriber.language.locale(),
        token
    )
}
