use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use services::payment::ports::PaymentError;

use crate::{error::ApiError, models::WebhookAckResponse, state::AppState};

/// Stripe webhook
///
/// Receives provider webhook deliveries. The raw body is verified against the
/// Stripe-Signature header before any event is processed; a failed signature
/// leaves all state untouched.
#[utoipa::path(
    post,
    path = "/api/webhook",
    tag = "Webhook",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Event accepted", body = WebhookAckResponse),
        (status = 400, description = "Bad or missing signature", body = crate::error::ApiErrorResponse),
        (status = 503, description = "Payments not configured", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Webhook delivery without Stripe-Signature header");
            ApiError::bad_request("Missing Stripe-Signature header")
        })?;

    app_state
        .payment_service
        .handle_webhook(&body, signature)
        .await
        .map_err(|e| match e {
            PaymentError::WebhookVerificationFailed(msg) => {
                tracing::warn!("Webhook signature rejected: {}", msg);
                ApiError::bad_request(format!("Webhook verification failed: {}", msg))
            }
            PaymentError::NotConfigured => ApiError::payments_not_configured(),
            PaymentError::InternalError(msg) => {
                tracing::warn!("Malformed webhook payload: {}", msg);
                ApiError::bad_request(msg)
            }
            other => {
                tracing::error!("Failed to process webhook: {}", other);
                ApiError::internal_server_error("Failed to process webhook")
            }
        })?;

    Ok(Json(WebhookAckResponse { received: true }))
}
