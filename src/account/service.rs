use sqlx::PgPool;

use super::models::{Account, Role};
use crate::auth::password::hash_password;
use crate::errors::AppError;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, phone, password_hash, role, created_at, updated_at";

/// Emails are stored and compared lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Service layer for account business logic.
pub struct AccountService;

impl AccountService {
    /// Register a new account. Fails with Conflict when the email is taken.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<Account, AppError> {
        let email = normalize_email(email);

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE email = $1")
            .bind(&email)
            .fetch_one(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if existing > 0 {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(password)?;

        // A concurrent sign-up can still win the race; the unique index decides.
        sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (name, email, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(&email)
        .bind(phone.map(str::trim))
        .bind(&password_hash)
        .bind(Role::User.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email already registered".to_string()),
            other => other,
        })
    }

    /// Get an account by ID.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Account {id} not found")))
    }

    /// Get an account by email, compared case-insensitively.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// List all accounts.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Account>, AppError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id ASC"
        ))
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }
}
