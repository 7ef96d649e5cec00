use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cart::ports::NewCartItem;
use crate::types::{PaymentId, UserId};

/// Metadata keys attached to every payment intent
pub const METADATA_USER_ID: &str = "user_id";
pub const METADATA_EMAIL: &str = "email";
pub const METADATA_CART_ITEMS: &str = "cart_items";

/// One recorded provider charge for one cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    /// Line amount in minor currency units
    pub amount: i64,
    /// The provider's payment intent id
    pub provider_payment_id: String,
    pub status: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Minimized per-item projection embedded in intent metadata and read
/// back by the webhook. This, not the live cart, drives Payment
/// fan-out, so the two can diverge if the cart changed in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentItemProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Computed line total in minor currency units
    pub amount: i64,
}

/// Error types for checkout and webhook operations
#[derive(Debug)]
pub enum PaymentError {
    /// Stripe secrets are not configured
    NotConfigured,
    /// Webhook signature verification failed
    WebhookVerificationFailed(String),
    /// Payment provider error
    ProviderError(String),
    /// Database error
    DatabaseError(String),
    /// Internal error
    InternalError(String),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "Stripe is not configured"),
            Self::WebhookVerificationFailed(msg) => {
                write!(f, "Webhook verification failed: {}", msg)
            }
            Self::ProviderError(msg) => write!(f, "Payment provider error: {}", msg),
            Self::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for PaymentError {}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

/// Repository trait for payment records
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist one payment record
    async fn insert_payment(&self, payment: Payment) -> anyhow::Result<Payment>;

    /// The user's payments, newest first
    async fn list_payments(&self, user_id: UserId) -> anyhow::Result<Vec<Payment>>;
}

/// Service trait wrapping payment intent creation at the provider
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Create one client-confirmable payment intent for the given amount
    /// (major currency units) carrying the cart projection as metadata.
    /// Returns the provider's client secret.
    async fn create_payment_intent(
        &self,
        user_id: UserId,
        email: &str,
        amount_major: i64,
        items: &[NewCartItem],
    ) -> Result<String, PaymentError>;
}

/// Seam between webhook parsing and state mutation. Fan-out is driven by
/// the metadata embedded in the intent, never by a re-read of the live
/// cart; keeping this behind a trait makes that divergence visible.
#[async_trait]
pub trait PaymentEventProjector: Send + Sync {
    /// Apply a succeeded payment intent: one Payment per projected item,
    /// mark the user's unpaid orders paid, clear the user's cart.
    async fn apply_succeeded_intent(
        &self,
        user_id: UserId,
        intent_id: &str,
        currency: &str,
        items: Vec<PaymentItemProjection>,
    ) -> Result<(), PaymentError>;
}

/// Service trait for handling provider webhook deliveries
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Verify and process one webhook delivery. Signature failure is
    /// fail-closed: an error is returned and nothing is mutated.
    async fn handle_webhook(&self, payload: &[u8], signature: &str) -> Result<(), PaymentError>;

    /// The user's payment records, newest first
    async fn list_payments(&self, user_id: UserId) -> Result<Vec<Payment>, PaymentError>;
}
