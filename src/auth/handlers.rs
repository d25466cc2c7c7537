use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::account::models::AccountResponse;
use crate::account::AccountService;
use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedAccount;

use super::jwt::TokenSettings;
use super::models::{AccountIdResponse, AuthenticatedAccountResponse, SignInDto, SignUpDto};
use super::service::AuthService;

/// POST /v1/auth/sign-in - Authenticate and get a bearer token
#[utoipa::path(
    post,
    path = "/v1/auth/sign-in",
    tag = "Auth",
    request_body = SignInDto,
    responses(
        (status = 200, description = "Authenticated", body = AuthenticatedAccountResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    pool: web::Data<PgPool>,
    settings: web::Data<TokenSettings>,
    body: web::Json<SignInDto>,
) -> Result<HttpResponse, AppError> {
    info!(email = %body.email, "Authenticating account by email");

    let account =
        AuthService::authenticate(pool.get_ref(), settings.get_ref(), &body.email, &body.password)
            .await?;

    Ok(HttpResponse::Ok().json(account))
}

/// POST /v1/auth/sign-up - Register a new account
#[utoipa::path(
    post,
    path = "/v1/auth/sign-up",
    tag = "Auth",
    request_body = SignUpDto,
    responses(
        (status = 201, description = "Account created", body = AccountIdResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn sign_up(
    pool: web::Data<PgPool>,
    body: web::Json<SignUpDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    info!(name = %body.name, email = %body.email, "Creating account");

    let account = AccountService::create(
        pool.get_ref(),
        &body.name,
        &body.email,
        &body.password,
        body.phone.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Created().json(AccountIdResponse { id: account.id }))
}

/// DELETE /v1/auth/sign-out - Invalidate the caller's sessions
#[utoipa::path(
    delete,
    path = "/v1/auth/sign-out",
    tag = "Auth",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn sign_out(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse, AppError> {
    info!(email = %auth.email, "Signing out account by email");

    let revoked = AuthService::invalidate(pool.get_ref(), &auth.email).await?;
    info!(account_id = auth.id, revoked, "Sessions revoked");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /v1/auth/me - Get the caller's account
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse, AppError> {
    let account = AccountService::find_by_id(pool.get_ref(), auth.id).await?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}
