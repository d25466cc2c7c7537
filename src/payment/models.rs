use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::AppError;

const MAX_DESCRIPTION_LEN: usize = 255;

/// `payments.amount` is NUMERIC(14, 2)
const AMOUNT_SCALE: u32 = 2;
const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

/// Kind of change an edition event applies to a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum EditionType {
    Create,
    Update,
    Delete,
}

impl EditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditionType::Create => "CREATE",
            EditionType::Update => "UPDATE",
            EditionType::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for EditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database model for payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub owner_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment information returned in responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: i64,
    pub category_id: i64,
    /// Payment amount (always positive)
    #[schema(example = 42.50)]
    pub amount: Decimal,
    #[schema(example = "Weekly groceries")]
    pub description: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            category_id: p.category_id,
            amount: p.amount,
            description: p.description,
            paid_at: p.paid_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Payment fields carried by an edition event. Which fields are required
/// depends on the edition type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Target payment (UPDATE and DELETE only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Owning account; set from the caller when published over HTTP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 42.50)]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Queue payload: one payment edition plus its idempotency key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEditionMessage {
    pub message_id: Uuid,
    #[serde(rename = "type")]
    pub edition_type: EditionType,
    pub payment: PaymentPayload,
}

impl PaymentEditionMessage {
    pub fn new(edition_type: EditionType, payment: PaymentPayload) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            edition_type,
            payment,
        }
    }

    /// Check the payload carries exactly what its edition type needs
    pub fn validate_shape(&self) -> Result<(), AppError> {
        let p = &self.payment;
        let invalid = |msg: &str| -> Result<(), AppError> {
            Err(AppError::ValidationError(format!(
                "{} edition: {msg}",
                self.edition_type
            )))
        };

        if p.account_id.is_none() {
            return invalid("accountId is required");
        }
        if let Some(amount) = p.amount {
            if amount <= Decimal::ZERO {
                return invalid("amount must be positive");
            }
            if amount.normalize().scale() > AMOUNT_SCALE {
                return invalid("amount must have at most 2 decimal places");
            }
            if amount >= Decimal::from(AMOUNT_LIMIT) {
                return invalid("amount must be less than 1000000000000");
            }
        }
        if let Some(description) = &p.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return invalid("description must be at most 255 characters");
            }
        }

        match self.edition_type {
            EditionType::Create => {
                if p.id.is_some() {
                    return invalid("id must not be set");
                }
                if p.category_id.is_none() {
                    return invalid("categoryId is required");
                }
                if p.amount.is_none() {
                    return invalid("amount is required");
                }
            }
            EditionType::Update => {
                if p.id.is_none() {
                    return invalid("id is required");
                }
                if p.category_id.is_none()
                    && p.amount.is_none()
                    && p.description.is_none()
                    && p.paid_at.is_none()
                {
                    return invalid("at least one field to change is required");
                }
            }
            EditionType::Delete => {
                if p.id.is_none() {
                    return invalid("id is required");
                }
            }
        }

        Ok(())
    }
}

/// Request body for publishing a payment edition
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentEditionRequest {
    #[serde(rename = "type")]
    pub edition_type: EditionType,
    pub payment: PaymentPayload,
}

/// Response for an accepted (queued) edition
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditionAcceptedResponse {
    pub message_id: Uuid,
}

/// Result of applying one edition event
#[derive(Debug, Clone, PartialEq)]
pub enum EditionOutcome {
    Created(Payment),
    Updated(Payment),
    Deleted(i64),
    /// The message id was already applied; nothing changed
    Duplicate,
}

/// Path parameters for payment ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentIdPath {
    /// Payment ID
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn payload() -> PaymentPayload {
        PaymentPayload {
            account_id: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_queue_payload() {
        let raw = json!({
            "messageId": "6f1c1f0e-8a4e-4a57-9c1b-1c1f5f7d2a10",
            "type": "CREATE",
            "payment": {
                "accountId": 3,
                "categoryId": 9,
                "amount": "12.50",
                "description": "Lunch"
            }
        });

        let message: PaymentEditionMessage = serde_json::from_value(raw).expect("should parse");
        assert_eq!(message.edition_type, EditionType::Create);
        assert_eq!(message.payment.account_id, Some(3));
        assert_eq!(message.payment.category_id, Some(9));
        assert_eq!(message.payment.amount, Some(dec!(12.50)));
        assert!(message.validate_shape().is_ok());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let raw = json!({
            "messageId": "6f1c1f0e-8a4e-4a57-9c1b-1c1f5f7d2a10",
            "type": "UPSERT",
            "payment": {}
        });
        assert!(serde_json::from_value::<PaymentEditionMessage>(raw).is_err());
    }

    #[test]
    fn test_missing_message_id_is_rejected() {
        let raw = json!({ "type": "DELETE", "payment": { "id": 1, "accountId": 1 } });
        assert!(serde_json::from_value::<PaymentEditionMessage>(raw).is_err());
    }

    #[test]
    fn test_create_requires_category_and_amount() {
        let message = PaymentEditionMessage::new(EditionType::Create, payload());
        assert!(matches!(
            message.validate_shape(),
            Err(AppError::ValidationError(_))
        ));

        let message = PaymentEditionMessage::new(
            EditionType::Create,
            PaymentPayload {
                category_id: Some(2),
                amount: Some(dec!(10)),
                ..payload()
            },
        );
        assert!(message.validate_shape().is_ok());
    }

    #[test]
    fn test_create_rejects_id() {
        let message = PaymentEditionMessage::new(
            EditionType::Create,
            PaymentPayload {
                id: Some(5),
                category_id: Some(2),
                amount: Some(dec!(10)),
                ..payload()
            },
        );
        assert!(message.validate_shape().is_err());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let message = PaymentEditionMessage::new(
            EditionType::Create,
            PaymentPayload {
                category_id: Some(2),
                amount: Some(dec!(0)),
                ..payload()
            },
        );
        assert!(message.validate_shape().is_err());
    }

    #[test]
    fn test_amount_must_fit_two_decimal_places() {
        let create = |amount| {
            PaymentEditionMessage::new(
                EditionType::Create,
                PaymentPayload {
                    category_id: Some(2),
                    amount: Some(amount),
                    ..payload()
                },
            )
        };

        for amount in [dec!(12.345), dec!(0.001)] {
            assert!(matches!(
                create(amount).validate_shape(),
                Err(AppError::ValidationError(_))
            ));
        }

        // Trailing zeros do not count
        assert!(create(dec!(12.340)).validate_shape().is_ok());
        assert!(create(dec!(0.01)).validate_shape().is_ok());
    }

    #[test]
    fn test_amount_must_fit_column_precision() {
        let update = |amount| {
            PaymentEditionMessage::new(
                EditionType::Update,
                PaymentPayload {
                    id: Some(5),
                    amount: Some(amount),
                    ..payload()
                },
            )
        };

        assert!(update(dec!(10000000000000)).validate_shape().is_err());
        assert!(update(dec!(1000000000000)).validate_shape().is_err());
        assert!(update(dec!(999999999999.99)).validate_shape().is_ok());
    }

    #[test]
    fn test_update_needs_id_and_a_change() {
        let message = PaymentEditionMessage::new(
            EditionType::Update,
            PaymentPayload {
                id: Some(5),
                ..payload()
            },
        );
        assert!(message.validate_shape().is_err());

        let message = PaymentEditionMessage::new(
            EditionType::Update,
            PaymentPayload {
                id: Some(5),
                description: Some("Dinner".to_string()),
                ..payload()
            },
        );
        assert!(message.validate_shape().is_ok());
    }

    #[test]
    fn test_delete_needs_id() {
        let message = PaymentEditionMessage::new(EditionType::Delete, payload());
        assert!(message.validate_shape().is_err());

        let message = PaymentEditionMessage::new(
            EditionType::Delete,
            PaymentPayload {
                id: Some(5),
                ..payload()
            },
        );
        assert!(message.validate_shape().is_ok());
    }

    #[test]
    fn test_every_edition_needs_account() {
        let message = PaymentEditionMessage::new(
            EditionType::Delete,
            PaymentPayload {
                id: Some(5),
                ..Default::default()
            },
        );
        assert!(message.validate_shape().is_err());
    }

    #[test]
    fn test_serialized_message_uses_type_key() {
        let message = PaymentEditionMessage::new(
            EditionType::Delete,
            PaymentPayload {
                id: Some(5),
                ..payload()
            },
        );
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "DELETE");
        assert_eq!(value["payment"]["id"], 5);
        assert!(value["payment"].get("amount").is_none());
        assert!(value["messageId"].is_string());
    }
}
