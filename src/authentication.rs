//! Request identities.
//!
//! Login and sessions belong to the identity subsystem, which sits in front of
//! this service and forwards the authenticated account's email in a trusted
//! header. Admin routes use a static bearer token.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use secrecy::{ExposeSecret, Secret};
use std::future::{ready, Ready};

use crate::domain::subscriber_email::SubscriberEmail;
use crate::errors::NewsletterError;

pub const DEFAULT_IDENTITY_HEADER: &str = "X-Authenticated-Email";

/// Name of the header carrying the authenticated email.
pub struct IdentityHeader(pub String);

pub struct AdminToken(pub Secret<String>);

#[derive(Debug)]
pub struct AuthenticatedUser {
    pub email: SubscriberEmail,
}

/// Marker extractor for operator-only routes.
#[derive(Debug)]
pub struct AdminAccess;

impl FromRequest for AuthenticatedUser {
    type Error = NewsletterError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate_user(request))
    }
}

impl FromRequest for AdminAccess {
    type Error = NewsletterError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate_admin(request))
    }
}

fn authenticate_user(request: &HttpRequest) -> Result<AuthenticatedUser, NewsletterError> {
    let header_name = request
        .app_data::<web::Data<IdentityHeader>>()
        .map(|identity_header| identity_header.0.as_str())
        .unwrap_or(DEFAULT_IDENTITY_HEADER);

    let email = request
        .headers()
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or(NewsletterError::Unauthorized)?;

    let email = SubscriberEmail::parse(email.to_string()).map_err(|err| {
        tracing::warn!("Rejected identity header: {}", err);
        NewsletterError::Unauthorized
    })?;

    Ok(AuthenticatedUser { email })
}

fn authenticate_admin(request: &HttpRequest) -> Result<AdminAccess, NewsletterError> {
    let admin_token = request
        .app_data::<web::Data<AdminToken>>()
        .ok_or(NewsletterError::Unauthorized)?;

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(NewsletterError::Unauthorized)?;

    if provided != admin_token.0.expose_secret().as_str() {
        return Err(NewsletterError::Unauthorized);
    }

    Ok(AdminAccess)
}
