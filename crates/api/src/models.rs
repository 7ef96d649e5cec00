use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use services::{
    cart::ports::{CartItem, CartLine, CartUpdate, NewCartItem},
    order::ports::{MainOrder, OrderItem, PlacedOrder, ServiceOrder},
    payment::ports::Payment,
    CartItemId, OrderId, PaymentId, ServiceOrderId, UserId,
};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Cart requests

/// One cart line as sent by the client
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub image_url: Option<String>,
    /// Item category label
    #[serde(default)]
    pub type_of: String,
}

fn default_quantity() -> i64 {
    1
}

impl TryFrom<CartItemPayload> for NewCartItem {
    type Error = String;

    fn try_from(payload: CartItemPayload) -> Result<Self, Self::Error> {
        let line = match (payload.product_id, payload.service_id) {
            (Some(product_id), None) => CartLine::Product { product_id },
            (None, Some(service_id)) => CartLine::Service { service_id },
            (Some(_), Some(_)) => {
                return Err("Item must carry either a productId or a serviceId, not both".into())
            }
            (None, None) => {
                return Err("Item must carry a productId or a serviceId".into())
            }
        };

        Ok(NewCartItem {
            line,
            category: payload.type_of,
            name: payload.name,
            price: payload.price,
            quantity: payload.quantity,
            image_url: payload.image_url,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product: CartItemPayload,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemRequest {
    /// Product id, service id, or cart row id
    pub product_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    /// Product id, service id, or cart row id
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncCartRequest {
    pub cart_items: Vec<CartItemPayload>,
}

// ---------------------------------------------------------------------------
// Cart responses

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: CartItemId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub category: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.line.product_id().map(str::to_string),
            service_id: item.line.service_id().map(str::to_string),
            category: item.category,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            image_url: item.image_url,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub success: bool,
    pub cart_items: Vec<CartItemResponse>,
}

impl CartResponse {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            success: true,
            cart_items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearCartResponse {
    pub success: bool,
    pub deleted_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCartItemResponse {
    pub removed: bool,
}

/// Update outcome: the updated row, or a removal marker when quantity <= 0
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UpdateCartResponse {
    Updated(CartItemResponse),
    Removed(RemovedCartItemResponse),
}

impl From<CartUpdate> for UpdateCartResponse {
    fn from(update: CartUpdate) -> Self {
        match update {
            CartUpdate::Updated(item) => Self::Updated(item.into()),
            CartUpdate::Removed => Self::Removed(RemovedCartItemResponse { removed: true }),
        }
    }
}

// ---------------------------------------------------------------------------
// Order responses

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub name: String,
    pub category: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub line_total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            service_id: item.service_id,
            name: item.name,
            category: item.category,
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total,
            image_url: item.image_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MainOrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub item_count: i64,
    pub subtotal: i64,
    pub is_paid: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MainOrder> for MainOrderResponse {
    fn from(order: MainOrder) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            item_count: order.item_count,
            subtotal: order.subtotal,
            is_paid: order.is_paid,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderResponse {
    pub id: ServiceOrderId,
    pub main_order_id: OrderId,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub item_count: i64,
    pub subtotal: i64,
    pub is_paid: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceOrder> for ServiceOrderResponse {
    fn from(order: ServiceOrder) -> Self {
        Self {
            id: order.id,
            main_order_id: order.main_order_id,
            user_id: order.user_id,
            service_id: order.service_id,
            items: order.items.into_iter().map(Into::into).collect(),
            item_count: order.item_count,
            subtotal: order.subtotal,
            is_paid: order.is_paid,
            status: order.status,
            sub_details: order.sub_details,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub main_order: MainOrderResponse,
    pub service_orders: Vec<ServiceOrderResponse>,
}

impl From<PlacedOrder> for PlaceOrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            success: true,
            main_order: placed.main_order.into(),
            service_orders: placed.service_orders.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdersResponse {
    pub success: bool,
    pub orders: Vec<ServiceOrderResponse>,
}

// ---------------------------------------------------------------------------
// Payment models

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub amount: i64,
    pub stripe_payment_id: String,
    pub status: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            product_id: payment.product_id,
            service_id: payment.service_id,
            amount: payment.amount,
            stripe_payment_id: payment.provider_payment_id,
            status: payment.status,
            currency: payment.currency,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsResponse {
    pub success: bool,
    pub payments: Vec<PaymentResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// Total to charge, in major currency units
    pub amount: i64,
    pub cart_items: Vec<CartItemPayload>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAckResponse {
    pub received: bool,
}
