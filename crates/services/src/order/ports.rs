use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cart::ports::CartItem;
use crate::types::{OrderId, ServiceOrderId, UserId};

/// Order status carried as a plain string ("pending" until payment)
pub const ORDER_STATUS_PENDING: &str = "pending";

/// Aggregate order header spanning potentially multiple vendors/services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub item_count: i64,
    /// Sum of price x quantity over all cart rows, in minor currency units
    pub subtotal: i64,
    pub is_paid: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of one cart row taken at order time. Prices and names are
/// captured here and never re-read from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    pub name: String,
    pub category: String,
    /// Unit price in minor currency units at order time
    pub unit_price: i64,
    pub quantity: i64,
    /// unit_price x quantity
    pub line_total: i64,
    pub image_url: Option<String>,
}

impl OrderItem {
    /// Snapshot a cart row into an order item
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            product_id: item.line.product_id().map(str::to_string),
            service_id: item.line.service_id().map(str::to_string),
            name: item.name.clone(),
            category: item.category.clone(),
            unit_price: item.price,
            quantity: item.quantity,
            line_total: item.price * item.quantity,
            image_url: item.image_url.clone(),
        }
    }
}

/// Per-vendor/per-service breakdown of a MainOrder. Product-only cart
/// rows carry no service reference and group under `service_id = None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: ServiceOrderId,
    pub main_order_id: OrderId,
    pub user_id: UserId,
    pub service_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub item_count: i64,
    pub subtotal: i64,
    pub is_paid: bool,
    pub status: String,
    pub sub_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of materializing a cart into orders
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub main_order: MainOrder,
    pub service_orders: Vec<ServiceOrder>,
}

/// Error types for order operations
#[derive(Debug)]
pub enum OrderError {
    /// The user's cart holds no rows
    EmptyCart,
    /// Database error
    DatabaseError(String),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCart => write!(f, "Cart is empty"),
            Self::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for OrderError {}

impl From<anyhow::Error> for OrderError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

/// Repository trait for order records
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Delete every unpaid MainOrder and ServiceOrder for the user,
    /// returning the number of main orders removed
    async fn delete_unpaid_orders(&self, user_id: UserId) -> anyhow::Result<u64>;

    /// Persist a main order
    async fn insert_main_order(&self, order: MainOrder) -> anyhow::Result<MainOrder>;

    /// Persist a service order
    async fn insert_service_order(&self, order: ServiceOrder) -> anyhow::Result<ServiceOrder>;

    /// All unpaid main orders for a user
    async fn get_unpaid_main_orders(&self, user_id: UserId) -> anyhow::Result<Vec<MainOrder>>;

    /// The user's service orders, newest first
    async fn list_service_orders(&self, user_id: UserId) -> anyhow::Result<Vec<ServiceOrder>>;

    /// Mark every unpaid MainOrder and ServiceOrder for the user as paid,
    /// returning the number of rows touched
    async fn mark_paid_by_user(&self, user_id: UserId) -> anyhow::Result<u64>;
}

/// Service trait for checkout order materialization
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Materialize the user's cart into one MainOrder plus one
    /// ServiceOrder per distinct service reference. The cart itself is
    /// left untouched; only a successful payment clears it.
    async fn place_order(&self, user_id: UserId) -> Result<PlacedOrder, OrderError>;

    /// The user's service orders, newest first
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<ServiceOrder>, OrderError>;
}
