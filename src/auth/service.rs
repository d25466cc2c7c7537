use sqlx::PgPool;
use tracing::{info, warn};

use crate::account::models::Account;
use crate::account::service::normalize_email;
use crate::account::AccountService;
use crate::errors::AppError;
use crate::extractors::AuthenticatedAccount;

use super::jwt::{create_access_token, decode_token, TokenSettings};
use super::models::AuthenticatedAccountResponse;
use super::password::{verify_against_dummy, verify_password};
use super::session::SessionStore;

/// Authentication service: credential checks and session lifecycle
pub struct AuthService;

impl AuthService {
    /// Verify credentials and open a session.
    /// Unknown email and wrong password both fail with InvalidCredentials.
    pub async fn authenticate(
        pool: &PgPool,
        settings: &TokenSettings,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedAccountResponse, AppError> {
        let account = Self::verify_credentials(pool, email, password).await?;

        let session_token = SessionStore::open(pool, account.id, settings.ttl).await?;
        let token = create_access_token(&account, &session_token, settings)?;

        info!(account_id = account.id, "Account authenticated");

        Ok(AuthenticatedAccountResponse::new(&account, token))
    }

    async fn verify_credentials(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        let account = match AccountService::find_by_email(pool, email).await {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => {
                verify_against_dummy(password);
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password, &account.password_hash)? {
            warn!(account_id = account.id, "Sign-in with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Revoke every session of the account; returns how many were revoked
    pub async fn invalidate(pool: &PgPool, email: &str) -> Result<u64, AppError> {
        SessionStore::revoke_all_for_email(pool, &normalize_email(email)).await
    }

    /// Resolve the caller behind a bearer token
    pub async fn resolve_identity(
        pool: &PgPool,
        settings: &TokenSettings,
        token: &str,
    ) -> Result<AuthenticatedAccount, AppError> {
        let claims = decode_token(token, &settings.secret)?;
        SessionStore::resolve(pool, &claims.sid, claims.sub).await
    }
}
