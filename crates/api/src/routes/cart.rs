use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use services::cart::ports::{CartError, NewCartItem};

use crate::{error::ApiError, middleware::AuthenticatedUser, models::*, state::AppState};

fn map_cart_error(e: CartError) -> ApiError {
    match e {
        CartError::Validation(msg) => ApiError::bad_request(msg),
        CartError::NotFound => ApiError::not_found("Cart item not found"),
        CartError::DatabaseError(msg) => {
            tracing::error!("Cart database error: {}", msg);
            ApiError::internal_server_error("Failed to access cart")
        }
    }
}

/// Get cart
///
/// Returns all cart rows for the authenticated user. An empty cart is a 404.
#[utoipa::path(
    get,
    path = "/api/cart/get",
    tag = "Cart",
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 404, description = "Cart is empty", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn get_cart(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<CartResponse>, ApiError> {
    tracing::debug!("Getting cart for user_id={}", user.user_id);

    let items = app_state
        .cart_service
        .get_cart(user.user_id)
        .await
        .map_err(map_cart_error)?;

    if items.is_empty() {
        return Err(ApiError::not_found("Cart is empty"));
    }

    Ok(Json(CartResponse::new(items)))
}

/// Add item to cart
///
/// Adds an item to the user's cart. A row already holding the same product or
/// service reference has its quantity incremented instead.
#[utoipa::path(
    post,
    path = "/api/cart/add",
    tag = "Cart",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Item created or merged", body = CartItemResponse),
        (status = 400, description = "Invalid item", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn add_item(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartItemResponse>), ApiError> {
    tracing::info!("Adding cart item for user_id={}", user.user_id);

    let item = NewCartItem::try_from(request.product).map_err(ApiError::bad_request)?;

    let created = app_state
        .cart_service
        .add_item(user.user_id, item)
        .await
        .map_err(map_cart_error)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Remove item from cart
///
/// Removes the row matched by product id, service id, or cart row id.
#[utoipa::path(
    post,
    path = "/api/cart/remove",
    tag = "Cart",
    request_body = RemoveCartItemRequest,
    responses(
        (status = 200, description = "Item removed", body = SuccessResponse),
        (status = 404, description = "No matching item", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn remove_item(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<RemoveCartItemRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    tracing::info!(
        "Removing cart item for user_id={}, identifier={}",
        user.user_id,
        request.product_id
    );

    app_state
        .cart_service
        .remove_item(user.user_id, &request.product_id)
        .await
        .map_err(map_cart_error)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Update item quantity
///
/// Overwrites the matched row's quantity. A quantity of zero or less removes
/// the row.
#[utoipa::path(
    post,
    path = "/api/cart/update",
    tag = "Cart",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated item or removal marker", body = UpdateCartResponse),
        (status = 404, description = "No matching item", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<UpdateCartResponse>, ApiError> {
    tracing::info!(
        "Updating cart item for user_id={}, identifier={}, quantity={}",
        user.user_id,
        request.product_id,
        request.quantity
    );

    let update = app_state
        .cart_service
        .update_quantity(user.user_id, &request.product_id, request.quantity)
        .await
        .map_err(map_cart_error)?;

    Ok(Json(update.into()))
}

/// Sync cart
///
/// Reconciles a client-held cart against the server cart. Matching rows keep
/// the larger quantity; unmatched client items are inserted. Returns the full
/// merged server cart.
#[utoipa::path(
    post,
    path = "/api/cart/sync",
    tag = "Cart",
    request_body = SyncCartRequest,
    responses(
        (status = 200, description = "Merged cart", body = CartResponse),
        (status = 400, description = "Invalid item", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn sync_cart(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<SyncCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    tracing::info!(
        "Syncing cart for user_id={}, client_items={}",
        user.user_id,
        request.cart_items.len()
    );

    let client_items = request
        .cart_items
        .into_iter()
        .map(NewCartItem::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::bad_request)?;

    let merged = app_state
        .cart_service
        .sync_cart(user.user_id, client_items)
        .await
        .map_err(map_cart_error)?;

    Ok(Json(CartResponse::new(merged)))
}

/// Clear cart
///
/// Deletes every cart row for the user.
#[utoipa::path(
    post,
    path = "/api/cart/clear",
    tag = "Cart",
    responses(
        (status = 200, description = "Cart cleared", body = ClearCartResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiErrorResponse)
    ),
    security(("session_token" = []))
)]
pub async fn clear_cart(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ClearCartResponse>, ApiError> {
    tracing::info!("Clearing cart for user_id={}", user.user_id);

    let deleted_count = app_state
        .cart_service
        .clear_cart(user.user_id)
        .await
        .map_err(map_cart_error)?;

    Ok(Json(ClearCartResponse {
        success: true,
        deleted_count,
    }))
}

/// Cart routes, mounted under /api/cart
pub fn create_cart_router() -> Router<AppState> {
    Router::new()
        .route("/get", get(get_cart))
        .route("/add", post(add_item))
        .route("/remove", post(remove_item))
        .route("/update", post(update_item))
        .route("/sync", post(sync_cart))
        .route("/clear", post(clear_cart))
}
