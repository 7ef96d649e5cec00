use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use services::order::ports::OrderError;

use crate::{error::ApiError, middleware::AuthenticatedUser, models::*, state::AppState};

fn map_order_error(e: OrderError) -> ApiError {
    match e {
        OrderError::EmptyCart => ApiError::not_found("Cart is empty"),
        OrderError::DatabaseError(msg) => {
            tracing::error!("Order database error: {}", msg);
            ApiError::internal_server_error("Failed to access orders")
        }
    }
}

/// Place order
///
/// Materializes the user's cart into one MainOrder plus one ServiceOrder per
/// distinct service. Prior unpaid orders are replaced; the cart is left
/// untouched until payment succeeds.
#[utoipa::path(
    post,
    path = "/api/orders/add",
    tag = "Orders",
    responses(
        (status = 201, description = "Order placed", body = PlaceOrderResponse),
        (status = 404, description = "Cart is empty", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn place_order(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), ApiError> {
    tracing::info!("Placing order for user_id={}", user.user_id);

    let placed = app_state
        .order_service
        .place_order(user.user_id)
        .await
        .map_err(map_order_error)?;

    Ok((StatusCode::CREATED, Json(placed.into())))
}

/// List orders
///
/// Returns the user's service orders, newest first.
#[utoipa::path(
    get,
    path = "/api/orders/get",
    tag = "Orders",
    responses(
        (status = 200, description = "Service orders", body = OrdersResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<OrdersResponse>, ApiError> {
    tracing::debug!("Listing orders for user_id={}", user.user_id);

    let orders = app_state
        .order_service
        .list_orders(user.user_id)
        .await
        .map_err(map_order_error)?;

    Ok(Json(OrdersResponse {
        success: true,
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}

/// Order routes, mounted under /api/orders
pub fn create_orders_router() -> Router<AppState> {
    Router::new()
        .route("/add", post(place_order))
        .route("/get", get(list_orders))
}
