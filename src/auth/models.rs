use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::account::models::{Account, Role};

lazy_static! {
    /// Optional leading '+', then 7-15 digits with single spaces or dashes between groups
    static ref PHONE_RE: Regex =
        Regex::new(r"^\+?[0-9](?:[ -]?[0-9]){6,14}$").expect("Invalid phone regex");
}

// ============================================================================
// Sign-up / Sign-in Models
// ============================================================================

/// Validate password complexity: at least one uppercase, one lowercase, and one digit
fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lowercase && has_uppercase && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_complexity"))
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Request body for account sign-up
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpDto {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "validate_not_blank", message = "Name must not be blank"))]
    #[schema(example = "John Doe")]
    pub name: String,
    /// Email address, used as the login key
    #[validate(email(message = "Email must be a valid address"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Password (min 8 chars, must include uppercase, lowercase, and digit)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[validate(custom(
        function = "validate_password_complexity",
        message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
    ))]
    #[schema(example = "Password123")]
    pub password: String,
    /// Optional phone number
    #[validate(regex(path = *PHONE_RE, message = "Phone must be 7-15 digits"))]
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
}

/// Request body for sign-in
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInDto {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

/// Identifier of a freshly created account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountIdResponse {
    pub id: i64,
}

/// Public projection of an authenticated account, including its bearer token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticatedAccountResponse {
    pub id: i64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub role: Role,
    /// JWT access token to send as `Authorization: Bearer <token>`
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}

impl AuthenticatedAccountResponse {
    pub fn new(account: &Account, token: String) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            token,
        }
    }
}

// ============================================================================
// Token Models
// ============================================================================

/// JWT access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: i64,      // Account ID
    pub email: String, // Account email
    pub role: String,  // Account role
    pub sid: String,   // Raw session token, stored hashed server-side
    pub iat: usize,    // Issued at
    pub exp: usize,    // Expiration
}
