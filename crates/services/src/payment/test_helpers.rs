//! In-memory payment repository and checkout doubles for tests

use super::ports::{CheckoutService, Payment, PaymentError, PaymentRepository};
use crate::cart::ports::NewCartItem;
use crate::types::UserId;
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory `PaymentRepository`, for service and router tests
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: Mutex<Vec<Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_payments(&self) -> Vec<Payment> {
        self.payments.lock().expect("payment lock poisoned").clone()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn insert_payment(&self, payment: Payment) -> anyhow::Result<Payment> {
        self.payments
            .lock()
            .expect("payment lock poisoned")
            .push(payment.clone());
        Ok(payment)
    }

    async fn list_payments(&self, user_id: UserId) -> anyhow::Result<Vec<Payment>> {
        let payments = self.payments.lock().expect("payment lock poisoned");
        let mut rows: Vec<Payment> = payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

/// Checkout double that records calls and hands back a fixed client secret
#[derive(Default)]
pub struct MockCheckoutService {
    pub calls: Mutex<Vec<(UserId, String, i64, usize)>>,
}

impl MockCheckoutService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckoutService for MockCheckoutService {
    async fn create_payment_intent(
        &self,
        user_id: UserId,
        email: &str,
        amount_major: i64,
        items: &[NewCartItem],
    ) -> Result<String, PaymentError> {
        self.calls
            .lock()
            .expect("checkout lock poisoned")
            .push((user_id, email.to_string(), amount_major, items.len()));
        Ok("pi_test_secret_123".to_string())
    }
}
