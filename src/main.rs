use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{http::header, web, App, HttpServer};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pocketful::auth::TokenSettings;
use pocketful::config::Config;
use pocketful::jobs::JobScheduler;
use pocketful::openapi::ApiDoc;
use pocketful::queue::{PaymentEditionConsumer, Publisher};
use pocketful::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    // Configure connection pool with production-ready settings
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .expect("Failed to create pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let token_settings = TokenSettings::new(config.jwt_secret.clone(), config.token_ttl_minutes);
    let publisher = Publisher::new(config.consumer.queue.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer =
        PaymentEditionConsumer::new(pool.clone(), config.consumer.clone()).start(shutdown_rx.clone());
    let scheduler = JobScheduler::new(pool.clone(), config.retention.clone()).start(shutdown_rx);

    // Configure rate limiting for auth endpoints
    let auth_governor_config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .finish()
        .expect("Failed to create rate limiter config");

    let allowed_origins = config.cors_allowed_origins.clone();
    let bind = (config.host.clone(), config.port);

    info!(host = %bind.0, port = bind.1, "Starting server");

    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();

        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .split(',')
                    .any(|allowed| allowed.trim() == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            // Middleware (order matters: outer to inner)
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(token_settings.clone()))
            .app_data(web::Data::new(publisher.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .configure(routes::common)
            .service(
                web::scope("/v1/auth")
                    .wrap(Governor::new(&auth_governor_config))
                    .configure(routes::auth),
            )
            .service(web::scope("/v1").configure(routes::api))
    })
    .bind(bind)?
    .run()
    .await?;

    info!("Server stopped, shutting down background tasks");
    let _ = shutdown_tx.send(true);
    if let Err(e) = consumer.await {
        tracing::error!(error = %e, "Payment edition consumer task failed");
    }
    if let Err(e) = scheduler.await {
        tracing::error!(error = %e, "Job scheduler task failed");
    }

    Ok(())
}
