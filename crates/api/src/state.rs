use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub cart_service: Arc<dyn services::cart::ports::CartService>,
    pub order_service: Arc<dyn services::order::ports::OrderService>,
    pub checkout_service: Arc<dyn services::payment::ports::CheckoutService>,
    pub payment_service: Arc<dyn services::payment::ports::PaymentService>,
    pub session_repository: Arc<dyn services::auth::ports::SessionRepository>,
    pub user_repository: Arc<dyn services::auth::ports::UserRepository>,
}
