#![allow(dead_code)]

use api::{create_router_with_cors, AppState};
use axum_test::TestServer;
use services::auth::test_helpers::{InMemorySessionRepository, InMemoryUserRepository};
use services::cart::test_helpers::InMemoryCartRepository;
use services::cart::CartServiceImpl;
use services::order::test_helpers::InMemoryOrderRepository;
use services::order::OrderServiceImpl;
use services::payment::test_helpers::{InMemoryPaymentRepository, MockCheckoutService};
use services::payment::{PaymentEventProjectorImpl, StripePaymentService};
use services::UserId;
use std::sync::Arc;

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Test server over in-memory repositories, no Postgres or Stripe needed
pub struct TestContext {
    pub server: TestServer,
    pub cart_repo: Arc<InMemoryCartRepository>,
    pub order_repo: Arc<InMemoryOrderRepository>,
    pub payment_repo: Arc<InMemoryPaymentRepository>,
    pub session_repo: Arc<InMemorySessionRepository>,
    pub user_repo: Arc<InMemoryUserRepository>,
    pub checkout: Arc<MockCheckoutService>,
}

impl TestContext {
    /// Seed a user and an active session, returning the bearer token
    pub async fn login(&self, email: &str) -> (UserId, String) {
        let user_id = UserId::new();
        self.user_repo.seed_user(user_id, email);
        let token = self.session_repo.seed_session(user_id).await;
        (user_id, token)
    }
}

pub fn create_test_context() -> TestContext {
    let cart_repo = Arc::new(InMemoryCartRepository::new());
    let order_repo = Arc::new(InMemoryOrderRepository::new());
    let payment_repo = Arc::new(InMemoryPaymentRepository::new());
    let session_repo = Arc::new(InMemorySessionRepository::new());
    let user_repo = Arc::new(InMemoryUserRepository::new());
    let checkout = Arc::new(MockCheckoutService::new());

    let projector = Arc::new(PaymentEventProjectorImpl::new(
        payment_repo.clone(),
        order_repo.clone(),
        cart_repo.clone(),
    ));
    let payment_service = Arc::new(StripePaymentService::new(
        TEST_WEBHOOK_SECRET.to_string(),
        projector,
        payment_repo.clone(),
    ));

    let app_state = AppState {
        cart_service: Arc::new(CartServiceImpl::new(cart_repo.clone())),
        order_service: Arc::new(OrderServiceImpl::new(cart_repo.clone(), order_repo.clone())),
        checkout_service: checkout.clone(),
        payment_service,
        session_repository: session_repo.clone(),
        user_repository: user_repo.clone(),
    };

    let cors = config::CorsConfig {
        exact_matches: Vec::new(),
        wildcard_suffixes: Vec::new(),
    };

    let server = TestServer::new(create_router_with_cors(app_state, cors))
        .expect("failed to build test server");

    TestContext {
        server,
        cart_repo,
        order_repo,
        payment_repo,
        session_repo,
        user_repo,
        checkout,
    }
}

/// Compute a Stripe-Signature header the webhook verifier accepts
pub fn sign_webhook_payload(payload: &str, secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let timestamp = chrono::Utc::now().timestamp();
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_payload.as_bytes());
    let v1: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!("t={},v1={}", timestamp, v1)
}
