use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketplace API",
        description = "Multi-vendor marketplace backend: cart, orders, checkout and payments.",
        version = "1.0.0",
        license(name = "MIT",)
    ),
    paths(
        // Cart endpoints
        crate::routes::cart::get_cart,
        crate::routes::cart::add_item,
        crate::routes::cart::remove_item,
        crate::routes::cart::update_item,
        crate::routes::cart::sync_cart,
        crate::routes::cart::clear_cart,
        // Order endpoints
        crate::routes::orders::place_order,
        crate::routes::orders::list_orders,
        // Payment endpoints
        crate::routes::payments::list_payments,
        crate::routes::checkout::create_payment_intent,
        crate::routes::webhook::stripe_webhook,
    ),
    components(schemas(
        // Cart models
        crate::models::CartItemPayload,
        crate::models::AddCartItemRequest,
        crate::models::RemoveCartItemRequest,
        crate::models::UpdateCartItemRequest,
        crate::models::SyncCartRequest,
        crate::models::CartItemResponse,
        crate::models::CartResponse,
        crate::models::ClearCartResponse,
        crate::models::UpdateCartResponse,
        crate::models::SuccessResponse,
        // Order models
        crate::models::OrderItemResponse,
        crate::models::MainOrderResponse,
        crate::models::ServiceOrderResponse,
        crate::models::PlaceOrderResponse,
        crate::models::OrdersResponse,
        // Payment models
        crate::models::PaymentResponse,
        crate::models::PaymentsResponse,
        crate::models::CreatePaymentIntentRequest,
        crate::models::CreatePaymentIntentResponse,
        crate::models::WebhookAckResponse,
        crate::error::ApiErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Cart", description = "Per-user shopping cart endpoints"),
        (name = "Orders", description = "Checkout order materialization endpoints"),
        (name = "Checkout", description = "Payment intent creation"),
        (name = "Payments", description = "Payment ledger endpoints"),
        (name = "Webhook", description = "Payment provider webhook")
    )
)]
pub struct ApiDoc;

/// Security scheme addon for Bearer token authentication
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("session_token")
                        .description(Some("Bearer session token"))
                        .build(),
                ),
            )
        }
    }
}
