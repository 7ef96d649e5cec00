use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CartItemId, UserId};

/// Reference to the thing a cart row sells: a catalog product or a
/// vendor service booking. Exactly one reference per row, enforced by
/// the type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartLine {
    Product { product_id: String },
    Service { service_id: String },
}

impl CartLine {
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::Product { product_id } => Some(product_id),
            Self::Service { .. } => None,
        }
    }

    pub fn service_id(&self) -> Option<&str> {
        match self {
            Self::Product { .. } => None,
            Self::Service { service_id } => Some(service_id),
        }
    }

    /// True when `identifier` names this line's product or service reference
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        match self {
            Self::Product { product_id } => product_id == identifier,
            Self::Service { service_id } => service_id == identifier,
        }
    }
}

/// One persisted cart row for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub line: CartLine,
    pub category: String,
    pub name: String,
    /// Unit price in minor currency units (cents)
    pub price: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding or syncing a cart row (id and timestamps assigned on insert)
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub line: CartLine,
    pub category: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

/// Outcome of a quantity update: quantity <= 0 removes the row
#[derive(Debug, Clone)]
pub enum CartUpdate {
    Updated(CartItem),
    Removed,
}

/// Error types for cart operations
#[derive(Debug)]
pub enum CartError {
    /// Malformed input; carries the first human-readable validation message
    Validation(String),
    /// No cart row matched the given identifier
    NotFound,
    /// Database error
    DatabaseError(String),
}

impl fmt::Display for CartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::NotFound => write!(f, "Cart item not found"),
            Self::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for CartError {}

impl From<anyhow::Error> for CartError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

/// Repository trait for cart rows
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// All cart rows for a user, oldest first
    async fn get_items(&self, user_id: UserId) -> anyhow::Result<Vec<CartItem>>;

    /// Find the row holding the same line reference, if any
    async fn find_by_line(&self, user_id: UserId, line: &CartLine)
        -> anyhow::Result<Option<CartItem>>;

    /// Find a row by product id, service id, or the row's own UUID
    async fn find_by_identifier(
        &self,
        user_id: UserId,
        identifier: &str,
    ) -> anyhow::Result<Option<CartItem>>;

    /// Insert a new row for the user
    async fn insert(&self, user_id: UserId, item: NewCartItem) -> anyhow::Result<CartItem>;

    /// Overwrite a row's quantity
    async fn set_quantity(&self, id: CartItemId, quantity: i64) -> anyhow::Result<CartItem>;

    /// Delete one row
    async fn delete(&self, id: CartItemId) -> anyhow::Result<()>;

    /// Delete all rows for a user, returning the number deleted
    async fn delete_all(&self, user_id: UserId) -> anyhow::Result<u64>;
}

/// Service trait for the per-user shopping cart
#[async_trait]
pub trait CartService: Send + Sync {
    /// All cart rows for the user
    async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartItem>, CartError>;

    /// Add an item; an existing row with the same line reference has its
    /// quantity incremented instead of a duplicate row being created
    async fn add_item(&self, user_id: UserId, item: NewCartItem) -> Result<CartItem, CartError>;

    /// Remove the row matched by product id, service id, or row UUID
    async fn remove_item(&self, user_id: UserId, identifier: &str) -> Result<(), CartError>;

    /// Overwrite a row's quantity; quantity <= 0 removes the row
    async fn update_quantity(
        &self,
        user_id: UserId,
        identifier: &str,
        quantity: i64,
    ) -> Result<CartUpdate, CartError>;

    /// Reconcile a client-held cart against the server cart. Matching rows
    /// keep the larger of the two quantities; unmatched client items are
    /// inserted. Returns the full merged server cart.
    async fn sync_cart(
        &self,
        user_id: UserId,
        client_items: Vec<NewCartItem>,
    ) -> Result<Vec<CartItem>, CartError>;

    /// Delete all rows for the user, returning the number deleted
    async fn clear_cart(&self, user_id: UserId) -> Result<u64, CartError>;
}
