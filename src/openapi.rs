use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::models::{AccountResponse, Role};
use crate::auth::models::{AccountIdResponse, AuthenticatedAccountResponse, SignInDto, SignUpDto};
use crate::category::models::{PaymentCategoryRequest, PaymentCategoryResponse};
use crate::errors::ErrorResponse;
use crate::payment::models::{
    EditionAcceptedResponse, EditionType, PaymentEditionRequest, PaymentPayload, PaymentResponse,
};

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token bound to a session"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pocketful API",
        version = "1.0.0",
        description = "Personal finance backend: accounts, payment categories and payments"
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Sign-up, sign-in and sessions"),
        (name = "Accounts", description = "Account lookup"),
        (name = "Payment categories", description = "Payment category management"),
        (name = "Payments", description = "Payments and asynchronous payment editions")
    ),
    paths(
        crate::routes::health_check,
        // Auth endpoints
        crate::auth::handlers::sign_in,
        crate::auth::handlers::sign_up,
        crate::auth::handlers::sign_out,
        crate::auth::handlers::me,
        // Account endpoints
        crate::account::handlers::list_accounts,
        crate::account::handlers::get_account,
        // Category endpoints
        crate::category::handlers::list_categories,
        crate::category::handlers::get_category,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::delete_category,
        // Payment endpoints
        crate::payment::handlers::list_payments,
        crate::payment::handlers::get_payment,
        crate::payment::handlers::submit_edition,
    ),
    components(
        schemas(
            ErrorResponse,
            // Auth schemas
            SignInDto,
            SignUpDto,
            AccountIdResponse,
            AuthenticatedAccountResponse,
            // Account schemas
            Role,
            AccountResponse,
            // Category schemas
            PaymentCategoryRequest,
            PaymentCategoryResponse,
            // Payment schemas
            EditionType,
            PaymentPayload,
            PaymentEditionRequest,
            EditionAcceptedResponse,
            PaymentResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/health",
            "/v1/auth/sign-in",
            "/v1/auth/sign-up",
            "/v1/auth/sign-out",
            "/v1/accounts",
            "/v1/accounts/{id}",
            "/v1/payments/categories",
            "/v1/payments/categories/{id}",
            "/v1/payments",
            "/v1/payments/{id}",
            "/v1/payments/editions",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
