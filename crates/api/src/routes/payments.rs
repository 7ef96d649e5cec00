use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};
use services::payment::ports::PaymentError;

use crate::{error::ApiError, middleware::AuthenticatedUser, models::*, state::AppState};

/// List payments
///
/// Returns the user's payment records, newest first.
#[utoipa::path(
    get,
    path = "/api/payments/get",
    tag = "Payments",
    responses(
        (status = 200, description = "Payment records", body = PaymentsResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<PaymentsResponse>, ApiError> {
    tracing::debug!("Listing payments for user_id={}", user.user_id);

    let payments = app_state
        .payment_service
        .list_payments(user.user_id)
        .await
        .map_err(|e| match e {
            PaymentError::DatabaseError(msg) => {
                tracing::error!("Payment database error: {}", msg);
                ApiError::internal_server_error("Failed to access payments")
            }
            other => {
                tracing::error!("Failed to list payments: {}", other);
                ApiError::internal_server_error("Failed to access payments")
            }
        })?;

    Ok(Json(PaymentsResponse {
        success: true,
        payments: payments.into_iter().map(Into::into).collect(),
    }))
}

/// Payment routes, mounted under /api/payments
pub fn create_payments_router() -> Router<AppState> {
    Router::new().route("/get", get(list_payments))
}
