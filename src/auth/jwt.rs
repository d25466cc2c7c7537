use actix_web::HttpRequest;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};

use crate::account::models::Account;
use crate::errors::AppError;

use super::models::TokenClaims;

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Signing secret and lifetime shared by the token issuer and the extractor
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: Secret<String>,
    pub ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: Secret<String>, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl: Duration::minutes(ttl_minutes),
        }
    }
}

// ============================================================================
// JWT Access Token Utilities
// ============================================================================

/// Create a signed access token bound to an account and one session
pub fn create_access_token(
    account: &Account,
    session_token: &str,
    settings: &TokenSettings,
) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + settings.ttl;

    let claims = TokenClaims {
        sub: account.id,
        email: account.email.clone(),
        role: account.role.as_str().to_string(),
        sid: session_token.to_string(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Failed to create access token: {e}")))
}

/// Decode and validate a JWT access token
pub fn decode_token(token: &str, jwt_secret: &Secret<String>) -> Result<TokenClaims, AppError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
}

/// Extract Bearer token from Authorization header
pub fn extract_token(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })
}

// ============================================================================
// Session Token Utilities
// ============================================================================

/// Generate a random session token string (64 hex characters)
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Hash a session token for storage; only the hash is persisted
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use crate::account::models::Role;

    fn test_account() -> Account {
        Account {
            id: 42,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            password_hash: "irrelevant".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn settings(secret: &str) -> TokenSettings {
        TokenSettings::new(Secret::new(secret.to_string()), DEFAULT_TOKEN_TTL_MINUTES)
    }

    #[test]
    fn test_create_token_has_three_parts() {
        let token = create_access_token(&test_account(), "sid", &settings("test_secret"))
            .expect("Should create token");
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");
    }

    #[test]
    fn test_decode_token_round_trips_claims() {
        let settings = settings("test_secret");
        let token = create_access_token(&test_account(), "session-abc", &settings)
            .expect("Should create token");
        let claims = decode_token(&token, &settings.secret).expect("Should decode token");

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.sid, "session-abc");

        let now = Utc::now().timestamp() as usize;
        let expected_exp = now + (DEFAULT_TOKEN_TTL_MINUTES as usize) * 60;
        assert!(claims.exp >= expected_exp - 5 && claims.exp <= expected_exp + 5);
    }

    #[test]
    fn test_decode_token_wrong_secret() {
        let token = create_access_token(&test_account(), "sid", &settings("correct_secret"))
            .expect("Should create token");
        let result = decode_token(&token, &Secret::new("wrong_secret".to_string()));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_decode_token_garbage() {
        let result = decode_token("invalid.token.here", &Secret::new("s".to_string()));
        assert!(result.is_err(), "Invalid token should fail");
    }

    #[test]
    fn test_extract_token_from_header() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(extract_token(&req).expect("token"), "abc.def.ghi");
    }

    #[test]
    fn test_extract_token_rejects_missing_and_wrong_scheme() {
        let req = TestRequest::default().to_http_request();
        assert!(extract_token(&req).is_err());

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(extract_token(&req).is_err());

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer "))
            .to_http_request();
        assert!(extract_token(&req).is_err());
    }

    #[test]
    fn test_generate_session_token_length_and_uniqueness() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();
        assert_eq!(token1.len(), 64);
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_hash_session_token_deterministic() {
        assert_eq!(hash_session_token("t"), hash_session_token("t"));
        assert_ne!(hash_session_token("t1"), hash_session_token("t2"));
        assert_eq!(hash_session_token("t").len(), 64);
    }
}
