use sqlx::{PgConnection, PgPool};
use tracing::info;

use super::models::{EditionOutcome, EditionType, Payment, PaymentEditionMessage, PaymentPayload};
use crate::category::PaymentCategoryService;
use crate::errors::AppError;

const PAYMENT_COLUMNS: &str =
    "id, owner_id, category_id, amount, description, paid_at, created_at, updated_at";

/// Service layer for payment business logic.
pub struct PaymentService;

impl PaymentService {
    /// Apply one edition event atomically.
    ///
    /// The message id is recorded in the `payment_editions` ledger in the same
    /// transaction as the mutation, so a redelivered message is a no-op and a
    /// failed one leaves no trace.
    pub async fn process_payment_edition(
        pool: &PgPool,
        message: &PaymentEditionMessage,
    ) -> Result<EditionOutcome, AppError> {
        message.validate_shape()?;

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to begin transaction: {e}")))?;

        // Blocks on a concurrent delivery of the same message until it commits or rolls back
        let recorded = sqlx::query(
            r#"
            INSERT INTO payment_editions (message_id, edition_type)
            VALUES ($1, $2)
            ON CONFLICT (message_id) DO NOTHING
            "#,
        )
        .bind(message.message_id)
        .bind(message.edition_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .rows_affected();

        if recorded == 0 {
            info!(
                message_id = %message.message_id,
                edition = %message.edition_type,
                "Payment edition already applied"
            );
            return Ok(EditionOutcome::Duplicate);
        }

        let outcome = match message.edition_type {
            EditionType::Create => {
                EditionOutcome::Created(Self::create(&mut tx, &message.payment).await?)
            }
            EditionType::Update => {
                EditionOutcome::Updated(Self::update(&mut tx, &message.payment).await?)
            }
            EditionType::Delete => {
                EditionOutcome::Deleted(Self::delete(&mut tx, &message.payment).await?)
            }
        };

        let payment_id = match &outcome {
            EditionOutcome::Created(p) | EditionOutcome::Updated(p) => Some(p.id),
            EditionOutcome::Deleted(id) => Some(*id),
            EditionOutcome::Duplicate => None,
        };

        sqlx::query("UPDATE payment_editions SET payment_id = $2 WHERE message_id = $1")
            .bind(message.message_id)
            .bind(payment_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to commit transaction: {e}")))?;

        info!(
            message_id = %message.message_id,
            edition = %message.edition_type,
            payment_id,
            "Payment edition applied"
        );

        Ok(outcome)
    }

    async fn create(conn: &mut PgConnection, payload: &PaymentPayload) -> Result<Payment, AppError> {
        let owner_id = required(payload.account_id, "accountId")?;
        let category_id = required(payload.category_id, "categoryId")?;
        let amount = required(payload.amount, "amount")?;

        if !PaymentCategoryService::verify_ownership(&mut *conn, category_id, owner_id).await? {
            return Err(AppError::NotFound(format!(
                "Payment category {category_id} not found"
            )));
        }

        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (owner_id, category_id, amount, description, paid_at)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(category_id)
        .bind(amount)
        .bind(payload.description.as_deref().map(str::trim))
        .bind(payload.paid_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create payment: {e}")))
    }

    async fn update(conn: &mut PgConnection, payload: &PaymentPayload) -> Result<Payment, AppError> {
        let payment_id = required(payload.id, "id")?;
        let owner_id = required(payload.account_id, "accountId")?;

        if let Some(category_id) = payload.category_id {
            if !PaymentCategoryService::verify_ownership(&mut *conn, category_id, owner_id).await? {
                return Err(AppError::NotFound(format!(
                    "Payment category {category_id} not found"
                )));
            }
        }

        sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET category_id = COALESCE($3, category_id),
                amount = COALESCE($4, amount),
                description = COALESCE($5, description),
                paid_at = COALESCE($6, paid_at),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(owner_id)
        .bind(payload.category_id)
        .bind(payload.amount)
        .bind(payload.description.as_deref().map(str::trim))
        .bind(payload.paid_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to update payment: {e}")))?
        .ok_or_else(|| AppError::NotFound(format!("Payment {payment_id} not found")))
    }

    async fn delete(conn: &mut PgConnection, payload: &PaymentPayload) -> Result<i64, AppError> {
        let payment_id = required(payload.id, "id")?;
        let owner_id = required(payload.account_id, "accountId")?;

        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND owner_id = $2")
            .bind(payment_id)
            .bind(owner_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to delete payment: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Payment {payment_id} not found")));
        }

        Ok(payment_id)
    }

    /// Get a payment by ID, ensuring the requesting account owns it.
    pub async fn find_by_id(
        pool: &PgPool,
        payment_id: i64,
        owner_id: i64,
    ) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND owner_id = $2"
        ))
        .bind(payment_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Payment {payment_id} not found")))
    }

    /// List an account's payments, most recent first.
    pub async fn find_all(pool: &PgPool, owner_id: i64) -> Result<Vec<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE owner_id = $1
            ORDER BY paid_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}
