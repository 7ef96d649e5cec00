pub mod cart;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod webhook;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use http::HeaderValue;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::ToSchema;

use crate::{middleware::AuthState, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// API version
    pub version: &'static str,
}

/// Health check endpoint
///
/// Returns the health status of the API service. This endpoint is typically used by
/// load balancers, monitoring systems, and orchestration tools to verify service availability.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn is_origin_allowed(origin_str: &str, cors_config: &config::CorsConfig) -> bool {
    if cors_config.exact_matches.iter().any(|o| o == origin_str) {
        return true;
    }

    if let Some(remainder) = origin_str.strip_prefix("http://localhost") {
        if remainder.is_empty() || remainder.starts_with(':') {
            return true;
        }
    }

    if let Some(remainder) = origin_str.strip_prefix("http://127.0.0.1") {
        if remainder.is_empty() || remainder.starts_with(':') {
            return true;
        }
    }

    if origin_str.starts_with("https://")
        && cors_config
            .wildcard_suffixes
            .iter()
            .any(|suffix| origin_str.ends_with(suffix))
    {
        return true;
    }

    false
}

/// Create the main API router with CORS configuration
pub fn create_router_with_cors(app_state: AppState, cors_config: config::CorsConfig) -> Router {
    // Create auth state for middleware
    let auth_state = AuthState {
        session_repository: app_state.session_repository.clone(),
        user_repository: app_state.user_repository.clone(),
    };

    // Authenticated commerce routes
    let cart_routes = cart::create_cart_router().layer(from_fn_with_state(
        auth_state.clone(),
        crate::middleware::auth_middleware,
    ));

    let order_routes = orders::create_orders_router().layer(from_fn_with_state(
        auth_state.clone(),
        crate::middleware::auth_middleware,
    ));

    let payment_routes = payments::create_payments_router().layer(from_fn_with_state(
        auth_state.clone(),
        crate::middleware::auth_middleware,
    ));

    let checkout_routes = checkout::create_checkout_router().layer(from_fn_with_state(
        auth_state,
        crate::middleware::auth_middleware,
    ));

    // Webhook and health stay public; the webhook authenticates itself
    // through its signature
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/webhook", post(webhook::stripe_webhook))
        .nest("/api/cart", cart_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/checkout", checkout_routes)
        .with_state(app_state);

    let cors_config_clone = cors_config.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts: &http::request::Parts| {
                let origin_str = match origin.to_str() {
                    Ok(s) => s,
                    Err(_) => return false,
                };
                is_origin_allowed(origin_str, &cors_config_clone)
            },
        ))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    router.layer(cors)
}
