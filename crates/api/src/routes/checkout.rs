use axum::{
    extract::{Extension, State},
    routing::post,
    Json, Router,
};
use services::cart::ports::NewCartItem;
use services::payment::ports::PaymentError;

use crate::{error::ApiError, middleware::AuthenticatedUser, models::*, state::AppState};

/// Create payment intent
///
/// Creates one Stripe payment intent for the given amount (major currency
/// units), carrying the user's id, email, and a minimized cart projection as
/// metadata. Returns the client secret for the caller to complete payment.
#[utoipa::path(
    post,
    path = "/api/checkout/create-payment-intent",
    tag = "Checkout",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CreatePaymentIntentResponse),
        (status = 400, description = "Invalid request or provider error", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse),
        (status = 503, description = "Payments not configured", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn create_payment_intent(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    tracing::info!(
        "Creating payment intent for user_id={}, amount={}",
        user.user_id,
        request.amount
    );

    if request.amount <= 0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }

    let items = request
        .cart_items
        .into_iter()
        .map(NewCartItem::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::bad_request)?;

    let client_secret = app_state
        .checkout_service
        .create_payment_intent(user.user_id, &user.email, request.amount, &items)
        .await
        .map_err(|e| match e {
            PaymentError::NotConfigured => ApiError::payments_not_configured(),
            PaymentError::ProviderError(msg) => {
                tracing::warn!("Payment provider rejected intent: {}", msg);
                ApiError::bad_request(msg)
            }
            other => {
                tracing::error!("Failed to create payment intent: {}", other);
                ApiError::internal_server_error("Failed to create payment intent")
            }
        })?;

    Ok(Json(CreatePaymentIntentResponse { client_secret }))
}

/// Checkout routes, mounted under /api/checkout
pub fn create_checkout_router() -> Router<AppState> {
    Router::new().route("/create-payment-intent", post(create_payment_intent))
}
