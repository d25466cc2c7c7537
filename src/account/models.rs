use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Permission level of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular account
    #[default]
    User,
    /// Administrative account
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A stored role outside the known set
#[derive(Debug, thiserror::Error)]
#[error("Unknown account role: {0}")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or(UnknownRole(value))
    }
}

/// Database entity for accounts
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account information returned in responses; never carries the password hash
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Unique account identifier
    pub id: i64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "+1 555 0100")]
    pub phone: Option<String>,
    pub role: Role,
    /// Sign-up timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

/// Path parameters for account ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct AccountIdPath {
    /// Account ID
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::Admin.as_str(), "ADMIN");
    }

    #[test]
    fn test_unknown_stored_role_is_an_error() {
        assert_eq!(Role::try_from("ADMIN".to_string()).unwrap(), Role::Admin);

        let err = Role::try_from("SUPERUSER".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown account role: SUPERUSER");
    }

    #[test]
    fn test_role_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "ADMIN");
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "USER");
    }

    #[test]
    fn test_response_hides_password_hash() {
        let account = Account {
            id: 7,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(AccountResponse::from(account)).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["role"], "ADMIN");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json["createdAt"].is_string());
    }
}
