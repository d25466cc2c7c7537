use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::info;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedAccount;

use super::models::{AccountIdPath, AccountResponse};
use super::service::AccountService;

/// GET /v1/accounts - List all accounts
#[utoipa::path(
    get,
    path = "/v1/accounts",
    tag = "Accounts",
    responses(
        (status = 200, description = "List of accounts", body = [AccountResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_accounts(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse, AppError> {
    info!(account_id = auth.id, "Listing accounts");

    let accounts: Vec<AccountResponse> = AccountService::find_all(pool.get_ref())
        .await?
        .into_iter()
        .map(AccountResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(accounts))
}

/// GET /v1/accounts/{id} - Get a specific account by ID
#[utoipa::path(
    get,
    path = "/v1/accounts/{id}",
    tag = "Accounts",
    params(AccountIdPath),
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_account(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
    path: web::Path<AccountIdPath>,
) -> Result<HttpResponse, AppError> {
    info!(account_id = auth.id, id = path.id, "Getting account by id");

    let account = AccountService::find_by_id(pool.get_ref(), path.id).await?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}
