use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::info;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedAccount;
use crate::queue::Publisher;

use super::models::{
    EditionAcceptedResponse, PaymentEditionMessage, PaymentEditionRequest, PaymentIdPath,
    PaymentResponse,
};
use super::service::PaymentService;

/// GET /v1/payments - List the caller's payments
#[utoipa::path(
    get,
    path = "/v1/payments",
    tag = "Payments",
    responses(
        (status = 200, description = "List of payments", body = [PaymentResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_payments(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
) -> Result<HttpResponse, AppError> {
    let payments: Vec<PaymentResponse> = PaymentService::find_all(pool.get_ref(), auth.id)
        .await?
        .into_iter()
        .map(PaymentResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(payments))
}

/// GET /v1/payments/{id} - Get a specific payment
#[utoipa::path(
    get,
    path = "/v1/payments/{id}",
    tag = "Payments",
    params(PaymentIdPath),
    responses(
        (status = 200, description = "Payment details", body = PaymentResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_payment(
    pool: web::Data<PgPool>,
    auth: AuthenticatedAccount,
    path: web::Path<PaymentIdPath>,
) -> Result<HttpResponse, AppError> {
    let payment = PaymentService::find_by_id(pool.get_ref(), path.id, auth.id).await?;

    Ok(HttpResponse::Ok().json(PaymentResponse::from(payment)))
}

/// POST /v1/payments/editions - Queue a payment edition for asynchronous processing
#[utoipa::path(
    post,
    path = "/v1/payments/editions",
    tag = "Payments",
    request_body = PaymentEditionRequest,
    responses(
        (status = 202, description = "Edition queued", body = EditionAcceptedResponse),
        (status = 400, description = "Malformed edition", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_edition(
    pool: web::Data<PgPool>,
    publisher: web::Data<Publisher>,
    auth: AuthenticatedAccount,
    body: web::Json<PaymentEditionRequest>,
) -> Result<HttpResponse, AppError> {
    let PaymentEditionRequest {
        edition_type,
        mut payment,
    } = body.into_inner();

    // Editions always act on the caller's own payments
    payment.account_id = Some(auth.id);

    let message = PaymentEditionMessage::new(edition_type, payment);
    message.validate_shape()?;

    info!(
        account_id = auth.id,
        message_id = %message.message_id,
        edition = %message.edition_type,
        "Queueing payment edition"
    );

    publisher
        .publish(pool.get_ref(), &message)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to queue payment edition: {e}")))?;

    Ok(HttpResponse::Accepted().json(EditionAcceptedResponse {
        message_id: message.message_id,
    }))
}
