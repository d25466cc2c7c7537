use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Database entity for payment categories
#[derive(Debug, Clone, FromRow)]
pub struct PaymentCategory {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment category returned in responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCategoryResponse {
    /// Unique category identifier
    pub id: i64,
    /// Category name
    #[schema(example = "Groceries")]
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentCategory> for PaymentCategoryResponse {
    fn from(category: PaymentCategory) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Request body for creating or renaming a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PaymentCategoryRequest {
    /// Category name (1-50 characters, not blank)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[validate(custom(function = "validate_not_blank", message = "Name must not be blank"))]
    #[schema(example = "Groceries")]
    pub name: String,
}

/// Path parameters for category ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryIdPath {
    /// Category ID
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_name() {
        let req = PaymentCategoryRequest {
            name: "Groceries".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_and_empty_names_rejected() {
        for name in ["", "   "] {
            let req = PaymentCategoryRequest {
                name: name.to_string(),
            };
            assert!(req.validate().is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_long_name_rejected() {
        let req = PaymentCategoryRequest {
            name: "x".repeat(51),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_missing_name_fails_to_deserialize() {
        let result = serde_json::from_str::<PaymentCategoryRequest>("{}");
        assert!(result.is_err());
    }
}
