use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::io::{Error, ErrorKind};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::authentication::{AdminToken, IdentityHeader};
use crate::config::{DatabaseSettings, Settings, SuppressionSourceKind};
use crate::domain::consent::ConsentPolicy;
use crate::email_client::EmailClient;
use crate::errors::{json_config, query_config};
use crate::routes::{
    handle_confirm_subscription, handle_create_subscription, handle_get_preference,
    handle_set_preference, handle_unsubscribe_authenticated, handle_unsubscribe_by_token,
    health_check, invalidate_suppression_cache, publish_newsletter, subscriber_stats,
};
use crate::suppression::{
    HttpSuppressionSource, RedisSuppressionSource, SendSuppressionGate, SuppressionCache,
    SuppressionConfigSource,
};

pub struct ApplicationBaseUrl(pub String);

/// Lifecycle knobs shared by the request handlers.
pub struct LifecycleSettings {
    pub confirm_token_ttl: chrono::Duration,
    pub consent_policy: ConsentPolicy,
}

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let sender_email = config
            .get_email_client_sender()
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            Some(config.get_email_client_timeout()),
        )
        .map_err(|err| Error::new(ErrorKind::Other, err))?;

        let source = build_suppression_source(&config)?;
        let cache = Arc::new(SuppressionCache::new(
            source,
            config.suppression.get_cache_ttl(),
        ));
        let gate = SendSuppressionGate::new(cache, db_pool.clone());

        let lifecycle = LifecycleSettings {
            confirm_token_ttl: config.newsletter.get_confirm_token_ttl(),
            consent_policy: ConsentPolicy::from_refresh_flag(
                config.newsletter.refresh_consent_on_resubscribe,
            ),
        };

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            db_pool,
            email_client,
            gate,
            config.get_app_base_url(),
            lifecycle,
            IdentityHeader(config.application.identity_header.clone()),
            AdminToken(config.application.admin_token.clone()),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn build_suppression_source(
    config: &Settings,
) -> Result<Arc<dyn SuppressionConfigSource>, std::io::Error> {
    let source: Arc<dyn SuppressionConfigSource> = match config.suppression.source {
        SuppressionSourceKind::Http => Arc::new(
            HttpSuppressionSource::new(config.suppression.http_url.clone())
                .map_err(|err| Error::new(ErrorKind::Other, err))?,
        ),
        SuppressionSourceKind::Redis => {
            let redis_client = redis::Client::open(config.get_redis_address())
                .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
            Arc::new(RedisSuppressionSource::new(redis_client))
        }
    };

    tracing::info!(
        "Suppression configuration source = {:?}",
        config.suppression.source
    );

    Ok(source)
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    email_client: EmailClient,
    gate: SendSuppressionGate,
    base_url: String,
    lifecycle: LifecycleSettings,
    identity_header: IdentityHeader,
    admin_token: AdminToken,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let email_client = web::Data::new(email_client);
    let gate = web::Data::new(gate);
    let base_url = web::Data::new(ApplicationBaseUrl(base_url));
    let lifecycle = web::Data::new(lifecycle);
    let identity_header = web::Data::new(identity_header);
    let admin_token = web::Data::new(admin_token);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .app_data(json_config())
            .app_data(query_config())
            .route("/health_check", web::get().to(health_check))
            .route(
                "/newsletter/subscribe",
                web::post().to(handle_create_subscription),
            )
            .route(
                "/newsletter/confirm",
                web::get().to(handle_confirm_subscription),
            )
            .service(
                web::resource("/newsletter/unsubscribe")
                    .route(web::get().to(handle_unsubscribe_by_token))
                    .route(web::post().to(handle_unsubscribe_authenticated)),
            )
            .service(
                web::resource("/user/newsletter")
                    .route(web::get().to(handle_get_preference))
                    .route(web::post().to(handle_set_preference)),
            )
            .route("/newsletters", web::post().to(publish_newsletter))
            .route(
                "/admin/suppression/invalidate",
                web::post().to(invalidate_suppression_cache),
            )
            .route("/admin/subscribers/stats", web::get().to(subscriber_stats))
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(gate.clone())
            .app_data(base_url.clone())
            .app_data(lifecycle.clone())
            .app_data(identity_header.clone())
            .app_data(admin_token.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
