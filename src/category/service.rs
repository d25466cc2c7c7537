use sqlx::{PgExecutor, PgPool};

use super::models::PaymentCategory;
use crate::errors::AppError;

/// Postgres SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Service layer for payment category business logic. Every call is scoped to
/// the owning account.
pub struct PaymentCategoryService;

impl PaymentCategoryService {
    fn sanitize_name(name: &str) -> Result<String, AppError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        Ok(name)
    }

    fn duplicate_name(err: sqlx::Error, name: &str) -> AppError {
        match AppError::from(err) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Category '{name}' already exists"))
            }
            other => other,
        }
    }

    /// Check the category exists and belongs to the owner
    pub async fn verify_ownership<'e, E>(
        executor: E,
        category_id: i64,
        owner_id: i64,
    ) -> Result<bool, AppError>
    where
        E: PgExecutor<'e>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payment_categories WHERE id = $1 AND owner_id = $2",
        )
        .bind(category_id)
        .bind(owner_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(count > 0)
    }

    /// Get all categories of an owner
    pub async fn find_all(pool: &PgPool, owner_id: i64) -> Result<Vec<PaymentCategory>, AppError> {
        sqlx::query_as::<_, PaymentCategory>(
            r#"
            SELECT id, owner_id, name, created_at, updated_at
            FROM payment_categories
            WHERE owner_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Get category by ID with ownership check
    pub async fn find_by_id(
        pool: &PgPool,
        category_id: i64,
        owner_id: i64,
    ) -> Result<PaymentCategory, AppError> {
        sqlx::query_as::<_, PaymentCategory>(
            r#"
            SELECT id, owner_id, name, created_at, updated_at
            FROM payment_categories
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(category_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Payment category {category_id} not found")))
    }

    /// Create a new category
    pub async fn create(
        pool: &PgPool,
        name: &str,
        owner_id: i64,
    ) -> Result<PaymentCategory, AppError> {
        let name = Self::sanitize_name(name)?;

        sqlx::query_as::<_, PaymentCategory>(
            r#"
            INSERT INTO payment_categories (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, owner_id, name, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .fetch_one(pool)
        .await
        .map_err(|e| Self::duplicate_name(e, &name))
    }

    /// Rename an existing category
    pub async fn update(
        pool: &PgPool,
        category_id: i64,
        name: &str,
        owner_id: i64,
    ) -> Result<PaymentCategory, AppError> {
        let name = Self::sanitize_name(name)?;

        sqlx::query_as::<_, PaymentCategory>(
            r#"
            UPDATE payment_categories
            SET name = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(owner_id)
        .bind(&name)
        .fetch_optional(pool)
        .await
        .map_err(|e| Self::duplicate_name(e, &name))?
        .ok_or_else(|| AppError::NotFound(format!("Payment category {category_id} not found")))
    }

    /// Delete a category; categories still referenced by payments are kept
    pub async fn delete(pool: &PgPool, category_id: i64, owner_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM payment_categories WHERE id = $1 AND owner_id = $2")
            .bind(category_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
                {
                    AppError::Conflict("Payment category is still used by payments".to_string())
                }
                other => AppError::InternalError(other.to_string()),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Payment category {category_id} not found"
            )));
        }

        Ok(())
    }
}
