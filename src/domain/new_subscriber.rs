use actix_web::web;
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_language::SubscriberLanguage;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub language: SubscriberLanguage,
}

#[derive(Deserialize)]
pub struct NewSubscriberBody {
    pub email: String,
    pub language: Option<String>,
}

impl TryFrom<web::Json<NewSubscriberBody>> for NewSubscriber {
    type Error = String;

    fn try_from(body: web::Json<NewSubscriberBody>) -> Result<Self, Self::Error> {
        let body = body.into_inner();
        let email = SubscriberEmail::parse(body.email)?;
        // A missing language falls back to the site default
        let language = match body.language {
            Some(language) => SubscriberLanguage::parse(language)?,
            None => SubscriberLanguage::default(),
        };

        Ok(NewSubscriber { email, language })
    }
}
