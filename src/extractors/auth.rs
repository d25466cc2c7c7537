use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::{FromRow, PgPool};

use crate::account::models::Role;
use crate::auth::jwt::extract_token;
use crate::auth::{AuthService, TokenSettings};
use crate::errors::AppError;

/// Request-scoped caller identity.
///
/// Validates the bearer JWT and checks its session is still active, so a
/// signed-out token is rejected even before it expires.
#[derive(Debug, Clone, FromRow)]
pub struct AuthenticatedAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

impl FromRequest for AuthenticatedAccount {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = extract_token(req);
        let settings = req.app_data::<web::Data<TokenSettings>>().cloned();
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let token = token?;
            let settings = settings.ok_or_else(|| {
                AppError::InternalError("Token settings not configured".to_string())
            })?;
            let pool = pool.ok_or_else(|| {
                AppError::InternalError("Database pool not configured".to_string())
            })?;

            AuthService::resolve_identity(pool.get_ref(), settings.get_ref(), &token).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App, HttpResponse, ResponseError};
    use secrecy::Secret;
    use sqlx::postgres::PgPoolOptions;

    async fn whoami(auth: AuthenticatedAccount) -> HttpResponse {
        HttpResponse::Ok().body(auth.email)
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/unused")
            .expect("lazy pool")
    }

    #[actix_rt::test]
    async fn test_missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(TokenSettings::new(
                    Secret::new("secret".to_string()),
                    60,
                )))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_garbage_token_is_unauthorized_without_touching_database() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(TokenSettings::new(
                    Secret::new("secret".to_string()),
                    60,
                )))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_missing_settings_is_internal_error() {
        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Bearer a.b.c"))
            .to_http_request();
        let err = AuthenticatedAccount::extract(&req)
            .await
            .expect_err("should fail");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
