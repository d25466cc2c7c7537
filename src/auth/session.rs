use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::extractors::AuthenticatedAccount;

use super::jwt::{generate_session_token, hash_session_token};

/// Server-side session table; the raw token lives only inside the JWT.
pub struct SessionStore;

impl SessionStore {
    /// Open a session for an account and return the raw session token
    pub async fn open(pool: &PgPool, account_id: i64, ttl: Duration) -> Result<String, AppError> {
        let raw_token = generate_session_token();
        let token_hash = hash_session_token(&raw_token);
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (account_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(account_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store session: {e}")))?;

        Ok(raw_token)
    }

    /// Resolve the caller behind a session token, joined with the owning account
    pub async fn resolve(
        pool: &PgPool,
        raw_token: &str,
        account_id: i64,
    ) -> Result<AuthenticatedAccount, AppError> {
        let token_hash = hash_session_token(raw_token);

        sqlx::query_as::<_, AuthenticatedAccount>(
            r#"
            SELECT a.id, a.name, a.email, a.role
            FROM sessions s
            INNER JOIN accounts a ON a.id = s.account_id
            WHERE s.token_hash = $1
              AND s.account_id = $2
              AND s.expires_at > NOW()
              AND s.revoked_at IS NULL
            "#,
        )
        .bind(&token_hash)
        .bind(account_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::Unauthorized("Session expired or signed out".to_string()))
    }

    /// Revoke every active session of the account with this email.
    /// Unknown emails revoke nothing.
    pub async fn revoke_all_for_email(pool: &PgPool, email: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions s
            SET revoked_at = NOW()
            FROM accounts a
            WHERE s.account_id = a.id
              AND a.email = $1
              AND s.revoked_at IS NULL
            "#,
        )
        .bind(email)
        .execute(pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to revoke sessions: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Number of sessions ever opened for an account
    pub async fn count_for_account(pool: &PgPool, account_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))
    }
}
