mod admin;
mod health_check;
mod newsletters;
mod subscriptions;
mod subscriptions_confirm;
mod subscriptions_unsubscribe;
mod user_newsletter;

pub use admin::{invalidate_suppression_cache, subscriber_stats};
pub use health_check::health_check;
pub use newsletters::publish_newsletter;
pub use subscriptions::handle_create_subscription;
pub use subscriptions_confirm::handle_confirm_subscription;
pub use subscriptions_unsubscribe::{handle_unsubscribe_authenticated, handle_unsubscribe_by_token};
pub use user_newsletter::{handle_get_preference, handle_set_preference};
