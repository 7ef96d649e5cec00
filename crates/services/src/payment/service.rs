use super::ports::{
    CheckoutService, Payment, PaymentError, PaymentEventProjector, PaymentItemProjection,
    PaymentRepository, PaymentService, METADATA_CART_ITEMS, METADATA_EMAIL, METADATA_USER_ID,
};
use crate::cart::ports::{CartRepository, NewCartItem};
use crate::order::ports::OrderRepository;
use crate::types::{PaymentId, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use stripe::{Client, CreatePaymentIntent, Currency, PaymentIntent, Webhook, WebhookError};

/// Payment intent bridge backed by the Stripe API
pub struct StripeCheckoutService {
    secret_key: String,
    currency: String,
}

impl StripeCheckoutService {
    pub fn new(secret_key: String, currency: String) -> Self {
        Self {
            secret_key,
            currency,
        }
    }

    fn get_stripe_client(&self) -> Client {
        Client::new(&self.secret_key)
    }
}

/// Project cart items into the minimized metadata shape
fn project_items(items: &[NewCartItem]) -> Vec<PaymentItemProjection> {
    items
        .iter()
        .map(|item| PaymentItemProjection {
            product_id: item.line.product_id().map(str::to_string),
            service_id: item.line.service_id().map(str::to_string),
            amount: item.price * item.quantity,
        })
        .collect()
}

#[async_trait]
impl CheckoutService for StripeCheckoutService {
    async fn create_payment_intent(
        &self,
        user_id: UserId,
        email: &str,
        amount_major: i64,
        items: &[NewCartItem],
    ) -> Result<String, PaymentError> {
        if self.secret_key.is_empty() {
            return Err(PaymentError::NotConfigured);
        }

        tracing::info!(
            "Creating payment intent for user_id={}, amount={}, items={}",
            user_id,
            amount_major,
            items.len()
        );

        let currency: Currency = self
            .currency
            .parse()
            .map_err(|_| PaymentError::InternalError(format!("Invalid currency: {}", self.currency)))?;

        let projections = project_items(items);
        let cart_items_json = serde_json::to_string(&projections)
            .map_err(|e| PaymentError::InternalError(format!("Failed to encode metadata: {}", e)))?;

        let metadata: HashMap<String, String> = HashMap::from([
            (METADATA_USER_ID.to_string(), user_id.to_string()),
            (METADATA_EMAIL.to_string(), email.to_string()),
            (METADATA_CART_ITEMS.to_string(), cart_items_json),
        ]);

        // Stripe amounts are in minor units
        let mut params = CreatePaymentIntent::new(amount_major * 100, currency);
        params.receipt_email = Some(email);
        params.metadata = Some(metadata);
        params.automatic_payment_methods = Some(stripe::CreatePaymentIntentAutomaticPaymentMethods {
            enabled: true,
            allow_redirects: None,
        });

        let client = self.get_stripe_client();
        let intent = PaymentIntent::create(&client, params)
            .await
            .map_err(|e| PaymentError::ProviderError(e.to_string()))?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| PaymentError::ProviderError("No client secret returned".into()))?;

        tracing::info!(
            "Payment intent created: user_id={}, intent_id={}",
            user_id,
            intent.id
        );

        Ok(client_secret)
    }
}

/// Default projector: writes Payment rows, marks orders paid, clears the cart
pub struct PaymentEventProjectorImpl {
    payment_repo: Arc<dyn PaymentRepository>,
    order_repo: Arc<dyn OrderRepository>,
    cart_repo: Arc<dyn CartRepository>,
}

impl PaymentEventProjectorImpl {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        order_repo: Arc<dyn OrderRepository>,
        cart_repo: Arc<dyn CartRepository>,
    ) -> Self {
        Self {
            payment_repo,
            order_repo,
            cart_repo,
        }
    }
}

#[async_trait]
impl PaymentEventProjector for PaymentEventProjectorImpl {
    async fn apply_succeeded_intent(
        &self,
        user_id: UserId,
        intent_id: &str,
        currency: &str,
        items: Vec<PaymentItemProjection>,
    ) -> Result<(), PaymentError> {
        tracing::info!(
            "Applying succeeded intent: user_id={}, intent_id={}, items={}",
            user_id,
            intent_id,
            items.len()
        );

        let now = Utc::now();
        for item in items {
            self.payment_repo
                .insert_payment(Payment {
                    id: PaymentId::new(),
                    user_id,
                    product_id: item.product_id,
                    service_id: item.service_id,
                    amount: item.amount,
                    provider_payment_id: intent_id.to_string(),
                    status: "succeeded".to_string(),
                    currency: currency.to_string(),
                    created_at: now,
                })
                .await
                .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;
        }

        let marked = self
            .order_repo
            .mark_paid_by_user(user_id)
            .await
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        // The only point after checkout where the cart is cleared
        let cleared = self
            .cart_repo
            .delete_all(user_id)
            .await
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "Intent applied: user_id={}, orders_marked_paid={}, cart_rows_cleared={}",
            user_id,
            marked,
            cleared
        );

        Ok(())
    }
}

/// Webhook handler backed by Stripe signature verification
pub struct StripePaymentService {
    webhook_secret: String,
    projector: Arc<dyn PaymentEventProjector>,
    payment_repo: Arc<dyn PaymentRepository>,
}

impl StripePaymentService {
    pub fn new(
        webhook_secret: String,
        projector: Arc<dyn PaymentEventProjector>,
        payment_repo: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            webhook_secret,
            projector,
            payment_repo,
        }
    }

    /// Pull the succeeded-intent fields out of the verified payload
    fn parse_succeeded_intent(
        payload_json: &serde_json::Value,
    ) -> Result<(UserId, String, String, Vec<PaymentItemProjection>), PaymentError> {
        let object = payload_json
            .get("data")
            .and_then(|d| d.get("object"))
            .ok_or_else(|| {
                PaymentError::InternalError("Webhook payload has no data.object".into())
            })?;

        let intent_id = object
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InternalError("Intent has no id".into()))?
            .to_string();

        let currency = object
            .get("currency")
            .and_then(|v| v.as_str())
            .unwrap_or("usd")
            .to_string();

        let metadata = object
            .get("metadata")
            .ok_or_else(|| PaymentError::InternalError("Intent has no metadata".into()))?;

        let user_id: UserId = metadata
            .get(METADATA_USER_ID)
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InternalError("No user_id in intent metadata".into()))?
            .parse()
            .map_err(|e| PaymentError::InternalError(format!("Invalid user_id: {}", e)))?;

        let items: Vec<PaymentItemProjection> = metadata
            .get(METADATA_CART_ITEMS)
            .and_then(|v| v.as_str())
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| PaymentError::InternalError(format!("Invalid cart_items metadata: {}", e)))?
            .unwrap_or_default();

        Ok((user_id, intent_id, currency, items))
    }
}

#[async_trait]
impl PaymentService for StripePaymentService {
    async fn handle_webhook(&self, payload: &[u8], signature: &str) -> Result<(), PaymentError> {
        if self.webhook_secret.is_empty() {
            return Err(PaymentError::NotConfigured);
        }

        let payload_str = std::str::from_utf8(payload).map_err(|e| {
            PaymentError::WebhookVerificationFailed(format!("Invalid UTF-8: {}", e))
        })?;

        // Verify the signature FIRST; nothing is mutated on failure.
        // construct_event does both verification and event parsing; only the
        // verification outcome matters here, the payload is re-read as JSON.
        if let Err(e) = Webhook::construct_event(payload_str, signature, &self.webhook_secret) {
            match e {
                WebhookError::BadKey
                | WebhookError::BadSignature
                | WebhookError::BadTimestamp(_)
                | WebhookError::BadHeader(_) => {
                    tracing::error!("Webhook signature verification failed: error={}", e);
                    return Err(PaymentError::WebhookVerificationFailed(e.to_string()));
                }
                WebhookError::BadParse(_) => {
                    tracing::debug!("Webhook event parsing failed (signature OK): error={}", e);
                }
            }
        }

        let payload_json: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::InternalError(format!("Invalid JSON: {}", e)))?;

        let event_id = payload_json
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let event_type = payload_json
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        tracing::info!(
            "Processing verified webhook: event_id={}, type={}",
            event_id,
            event_type
        );

        match event_type {
            "payment_intent.succeeded" => {
                let (user_id, intent_id, currency, items) =
                    Self::parse_succeeded_intent(&payload_json)?;
                self.projector
                    .apply_succeeded_intent(user_id, &intent_id, &currency, items)
                    .await?;
            }
            "payment_intent.payment_failed" => {
                // Log-only: orders stay pending, no state transition
                tracing::warn!(
                    "Payment failed: event_id={}, intent_id={:?}",
                    event_id,
                    payload_json
                        .get("data")
                        .and_then(|d| d.get("object"))
                        .and_then(|o| o.get("id"))
                        .and_then(|v| v.as_str())
                );
            }
            other => {
                tracing::debug!("Ignoring webhook event: event_id={}, type={}", event_id, other);
            }
        }

        Ok(())
    }

    async fn list_payments(&self, user_id: UserId) -> Result<Vec<Payment>, PaymentError> {
        tracing::debug!("Listing payments for user_id={}", user_id);

        let payments = self
            .payment_repo
            .list_payments(user_id)
            .await
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ports::{CartLine, CartService, NewCartItem};
    use crate::cart::test_helpers::InMemoryCartRepository;
    use crate::cart::CartServiceImpl;
    use crate::order::ports::{OrderService, ServiceOrder};
    use crate::order::test_helpers::InMemoryOrderRepository;
    use crate::order::OrderServiceImpl;
    use crate::payment::test_helpers::InMemoryPaymentRepository;
    use serde_json::json;

    fn service_item(service_id: &str, price: i64, quantity: i64) -> NewCartItem {
        NewCartItem {
            line: CartLine::Service {
                service_id: service_id.to_string(),
            },
            category: "tours".to_string(),
            name: format!("service {}", service_id),
            price,
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_project_items_computes_line_amounts() {
        let items = vec![
            service_item("svc_a", 1000, 2),
            NewCartItem {
                line: CartLine::Product {
                    product_id: "p1".to_string(),
                },
                category: "clothing".to_string(),
                name: "shirt".to_string(),
                price: 500,
                quantity: 3,
                image_url: None,
            },
        ];

        let projections = project_items(&items);
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].amount, 2000);
        assert_eq!(projections[0].service_id.as_deref(), Some("svc_a"));
        assert_eq!(projections[0].product_id, None);
        assert_eq!(projections[1].amount, 1500);
        assert_eq!(projections[1].product_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_projection_metadata_roundtrip() {
        let projections = project_items(&[service_item("svc_a", 250, 4)]);
        let encoded = serde_json::to_string(&projections).unwrap();
        let decoded: Vec<PaymentItemProjection> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].amount, 1000);
    }

    struct Fixture {
        cart_repo: Arc<InMemoryCartRepository>,
        order_repo: Arc<InMemoryOrderRepository>,
        payment_repo: Arc<InMemoryPaymentRepository>,
        projector: PaymentEventProjectorImpl,
    }

    fn fixture() -> Fixture {
        let cart_repo = Arc::new(InMemoryCartRepository::new());
        let order_repo = Arc::new(InMemoryOrderRepository::new());
        let payment_repo = Arc::new(InMemoryPaymentRepository::new());
        Fixture {
            projector: PaymentEventProjectorImpl::new(
                payment_repo.clone(),
                order_repo.clone(),
                cart_repo.clone(),
            ),
            cart_repo,
            order_repo,
            payment_repo,
        }
    }

    async fn checkout(f: &Fixture, user_id: UserId) -> Vec<ServiceOrder> {
        let cart_service = CartServiceImpl::new(f.cart_repo.clone());
        cart_service
            .add_item(user_id, service_item("svc_a", 1000, 2))
            .await
            .unwrap();
        cart_service
            .add_item(user_id, service_item("svc_b", 500, 1))
            .await
            .unwrap();
        let order_service = OrderServiceImpl::new(f.cart_repo.clone(), f.order_repo.clone());
        order_service.place_order(user_id).await.unwrap().service_orders
    }

    #[tokio::test]
    async fn test_projector_creates_one_payment_per_item() {
        let f = fixture();
        let user_id = UserId::new();
        checkout(&f, user_id).await;

        let items = vec![
            PaymentItemProjection {
                product_id: None,
                service_id: Some("svc_a".to_string()),
                amount: 2000,
            },
            PaymentItemProjection {
                product_id: None,
                service_id: Some("svc_b".to_string()),
                amount: 500,
            },
        ];

        f.projector
            .apply_succeeded_intent(user_id, "pi_test_1", "usd", items)
            .await
            .unwrap();

        let payments = f.payment_repo.list_payments(user_id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments
            .iter()
            .all(|p| p.provider_payment_id == "pi_test_1" && p.status == "succeeded"));
    }

    #[tokio::test]
    async fn test_projector_marks_orders_paid_and_clears_cart() {
        let f = fixture();
        let user_id = UserId::new();
        checkout(&f, user_id).await;

        f.projector
            .apply_succeeded_intent(user_id, "pi_test_2", "usd", Vec::new())
            .await
            .unwrap();

        assert!(f
            .order_repo
            .all_main_orders()
            .iter()
            .filter(|o| o.user_id == user_id)
            .all(|o| o.is_paid));
        assert!(f
            .order_repo
            .all_service_orders()
            .iter()
            .filter(|o| o.user_id == user_id)
            .all(|o| o.is_paid));
        assert!(f.cart_repo.get_items(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_projector_leaves_other_users_untouched() {
        let f = fixture();
        let paying_user = UserId::new();
        let other_user = UserId::new();
        checkout(&f, paying_user).await;
        checkout(&f, other_user).await;

        f.projector
            .apply_succeeded_intent(paying_user, "pi_test_3", "usd", Vec::new())
            .await
            .unwrap();

        let other_orders = f.order_repo.get_unpaid_main_orders(other_user).await.unwrap();
        assert_eq!(other_orders.len(), 1);
        assert_eq!(f.cart_repo.get_items(other_user).await.unwrap().len(), 2);
    }

    fn webhook_service(f: &Fixture) -> StripePaymentService {
        StripePaymentService::new(
            "whsec_test_secret".to_string(),
            Arc::new(PaymentEventProjectorImpl::new(
                f.payment_repo.clone(),
                f.order_repo.clone(),
                f.cart_repo.clone(),
            )),
            f.payment_repo.clone(),
        )
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature_without_mutation() {
        let f = fixture();
        let user_id = UserId::new();
        checkout(&f, user_id).await;
        let service = webhook_service(&f);

        let payload = json!({
            "id": "evt_test_1",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_test",
                "currency": "usd",
                "metadata": {
                    "user_id": user_id.to_string(),
                    "cart_items": "[]"
                }
            }}
        })
        .to_string();

        let err = service
            .handle_webhook(payload.as_bytes(), "t=1,v1=deadbeef")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerificationFailed(_)));

        // Fail-closed: nothing changed
        assert!(f.payment_repo.all_payments().is_empty());
        assert_eq!(f.cart_repo.get_items(user_id).await.unwrap().len(), 2);
        assert_eq!(
            f.order_repo.get_unpaid_main_orders(user_id).await.unwrap().len(),
            1
        );
    }

    // Compute a Stripe-Signature header the verifier accepts
    fn sign_payload(payload: &str, secret: &str) -> String {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let timestamp = chrono::Utc::now().timestamp();
        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signed_payload.as_bytes());
        let v1: String = mac
            .finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        format!("t={},v1={}", timestamp, v1)
    }

    #[tokio::test]
    async fn test_webhook_succeeded_event_applies_projection() {
        let f = fixture();
        let user_id = UserId::new();
        checkout(&f, user_id).await;
        let service = webhook_service(&f);

        let payload = json!({
            "id": "evt_test_4",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_test_6",
                "currency": "usd",
                "metadata": {
                    "user_id": user_id.to_string(),
                    "email": "buyer@example.com",
                    "cart_items": "[{\"service_id\":\"svc_a\",\"amount\":2000},{\"service_id\":\"svc_b\",\"amount\":500}]"
                }
            }}
        })
        .to_string();

        let signature = sign_payload(&payload, "whsec_test_secret");
        service
            .handle_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();

        let payments = f.payment_repo.list_payments(user_id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.provider_payment_id == "pi_test_6"));
        assert!(f.cart_repo.get_items(user_id).await.unwrap().is_empty());
        assert!(f
            .order_repo
            .get_unpaid_main_orders(user_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_webhook_failed_event_is_log_only() {
        let f = fixture();
        let user_id = UserId::new();
        checkout(&f, user_id).await;
        let service = webhook_service(&f);

        let payload = json!({
            "id": "evt_test_5",
            "type": "payment_intent.payment_failed",
            "data": { "object": { "id": "pi_test_7" } }
        })
        .to_string();

        let signature = sign_payload(&payload, "whsec_test_secret");
        service
            .handle_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();

        // Orders stay pending, cart stays populated
        assert_eq!(
            f.order_repo.get_unpaid_main_orders(user_id).await.unwrap().len(),
            1
        );
        assert_eq!(f.cart_repo.get_items(user_id).await.unwrap().len(), 2);
        assert!(f.payment_repo.all_payments().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_unknown_event_is_ignored() {
        let f = fixture();
        let service = webhook_service(&f);

        let payload = json!({
            "id": "evt_test_6",
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_test_1" } }
        })
        .to_string();

        let signature = sign_payload(&payload, "whsec_test_secret");
        service
            .handle_webhook(payload.as_bytes(), &signature)
            .await
            .unwrap();

        assert!(f.payment_repo.all_payments().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_rejects_garbage_signature_header() {
        let f = fixture();
        let service = webhook_service(&f);
        let err = service
            .handle_webhook(b"{}", "not-a-signature")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_parse_succeeded_intent_extracts_metadata() {
        let user_id = UserId::new();
        let payload = json!({
            "id": "evt_test_2",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_test_4",
                "currency": "eur",
                "metadata": {
                    "user_id": user_id.to_string(),
                    "email": "buyer@example.com",
                    "cart_items": "[{\"service_id\":\"svc_a\",\"amount\":2000}]"
                }
            }}
        });

        let (parsed_user, intent_id, currency, items) =
            StripePaymentService::parse_succeeded_intent(&payload).unwrap();
        assert_eq!(parsed_user, user_id);
        assert_eq!(intent_id, "pi_test_4");
        assert_eq!(currency, "eur");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, 2000);
    }

    #[test]
    fn test_parse_succeeded_intent_rejects_missing_user_id() {
        let payload = json!({
            "data": { "object": {
                "id": "pi_test_5",
                "currency": "usd",
                "metadata": { "cart_items": "[]" }
            }}
        });

        let err = StripePaymentService::parse_succeeded_intent(&payload).unwrap_err();
        assert!(matches!(err, PaymentError::InternalError(_)));
    }
}
