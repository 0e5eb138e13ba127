pub mod account;
pub mod consent;
pub mod new_subscriber;
pub mod subscriber;
pub mod subscriber_email;
pub mod subscriber_language;
pub mod subscriber_status;
pub mod token;
