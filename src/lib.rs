pub mod authentication;
pub mod config;
pub mod domain;
pub mod email_client;
pub mod errors;
pub mod notifications;
pub mod reconciliation;
pub mod routes;
pub mod startup;
pub mod store;
pub mod suppression;
pub mod telemetry;
pub mod templates;
