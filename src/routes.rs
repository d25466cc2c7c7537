//! Route table.
//!
//! Every endpoint is registered here explicitly. Order matters inside a scope:
//! literal paths are registered before `{id}` paths that would shadow them.

use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::{account, auth, category, payment};

/// Health check endpoint that verifies database connectivity
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and database are up"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health_check(pool: web::Data<PgPool>) -> impl Responder {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

/// Malformed JSON bodies become VALIDATION_ERROR responses
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

/// Non-numeric ids in the path become VALIDATION_ERROR responses
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

/// Health endpoint and extractor settings shared by every route
pub fn common(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .route("/health", web::get().to(health_check));
}

/// Routes mounted under `/v1/auth`
pub fn auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/sign-in", web::post().to(auth::sign_in))
        .route("/sign-up", web::post().to(auth::sign_up))
        .route("/sign-out", web::delete().to(auth::sign_out))
        .route("/me", web::get().to(auth::me));
}

/// Routes mounted under `/v1`
pub fn api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("", web::get().to(account::list_accounts))
            .route("/{id}", web::get().to(account::get_account)),
    )
    .service(
        web::scope("/payments")
            .service(
                web::resource("/categories")
                    .route(web::get().to(category::list_categories))
                    .route(web::post().to(category::create_category)),
            )
            .service(
                web::resource("/categories/{id}")
                    .route(web::get().to(category::get_category))
                    .route(web::put().to(category::update_category))
                    .route(web::delete().to(category::delete_category)),
            )
            .route("/editions", web::post().to(payment::submit_edition))
            .route("", web::get().to(payment::list_payments))
            .route("/{id}", web::get().to(payment::get_payment)),
    );
}

/// Full route table without rate limiting
pub fn configure(cfg: &mut web::ServiceConfig) {
    common(cfg);
    cfg.service(web::scope("/v1/auth").configure(auth))
        .service(web::scope("/v1").configure(api));
}
