use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedAccount;

use super::models::{CategoryIdPath, PaymentCategoryRequest, PaymentCategoryResponse};
use super::service::PaymentCategoryService;

/// GET /v1/payments/categories - List the caller's payment categories
#[utoipa::path(
    get,
    path = "/v1/payments/categories",
    tag = "Payment categories",
    responses(
        (status = 200, description = "List of categories", body = [PaymentCategoryResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse, AppError> {
    info!(account_id = auth.id, "Getting payment categories");

    let categories: Vec<PaymentCategoryResponse> =
        PaymentCategoryService::find_all(pool.get_ref(), auth.id)
            .await?
            .into_iter()
            .map(PaymentCategoryResponse::from)
            .collect();

    Ok(HttpResponse::Ok().json(categories))
}

/// GET /v1/payments/categories/{id} - Get a specific category
#[utoipa::path(
    get,
    path = "/v1/payments/categories/{id}",
    tag = "Payment categories",
    params(CategoryIdPath),
    responses(
        (status = 200, description = "Category details", body = PaymentCategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
    path: web::Path<CategoryIdPath>,
) -> Result<HttpResponse, AppError> {
    info!(account_id = auth.id, id = path.id, "Getting payment category by id");

    let category = PaymentCategoryService::find_by_id(pool.get_ref(), path.id, auth.id).await?;

    Ok(HttpResponse::Ok().json(PaymentCategoryResponse::from(category)))
}

/// POST /v1/payments/categories - Create a category
#[utoipa::path(
    post,
    path = "/v1/payments/categories",
    tag = "Payment categories",
    request_body = PaymentCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = PaymentCategoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
    body: web::Json<PaymentCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    info!(account_id = auth.id, name = %body.name, "Creating payment category");

    let category = PaymentCategoryService::create(pool.get_ref(), &body.name, auth.id).await?;

    Ok(HttpResponse::Created().json(PaymentCategoryResponse::from(category)))
}

/// PUT /v1/payments/categories/{id} - Rename a category
#[utoipa::path(
    put,
    path = "/v1/payments/categories/{id}",
    tag = "Payment categories",
    params(CategoryIdPath),
    request_body = PaymentCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = PaymentCategoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
    path: web::Path<CategoryIdPath>,
    body: web::Json<PaymentCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    info!(account_id = auth.id, id = path.id, name = %body.name, "Updating payment category");

    let category =
        PaymentCategoryService::update(pool.get_ref(), path.id, &body.name, auth.id).await?;

    Ok(HttpResponse::Ok().json(PaymentCategoryResponse::from(category)))
}

/// DELETE /v1/payments/categories/{id} - Delete a category
#[utoipa::path(
    delete,
    path = "/v1/payments/categories/{id}",
    tag = "Payment categories",
    params(CategoryIdPath),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still used by payments", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
    path: web::Path<CategoryIdPath>,
) -> Result<HttpResponse, AppError> {
    info!(account_id = auth.id, id = path.id, "Deleting payment category");

    PaymentCategoryService::delete(pool.get_ref(), path.id, auth.id).await?;

    Ok(HttpResponse::NoContent().finish())
}
