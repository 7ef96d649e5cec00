//! In-memory cart repository for tests

use super::ports::{CartItem, CartLine, CartRepository, NewCartItem};
use crate::types::{CartItemId, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

/// In-memory `CartRepository` backed by a Vec, for service and router tests
#[derive(Default)]
pub struct InMemoryCartRepository {
    items: Mutex<Vec<CartItem>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row, across all users
    pub fn all_items(&self) -> Vec<CartItem> {
        self.items.lock().expect("cart lock poisoned").clone()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn get_items(&self, user_id: UserId) -> anyhow::Result<Vec<CartItem>> {
        let items = self.items.lock().expect("cart lock poisoned");
        Ok(items
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_line(
        &self,
        user_id: UserId,
        line: &CartLine,
    ) -> anyhow::Result<Option<CartItem>> {
        let items = self.items.lock().expect("cart lock poisoned");
        Ok(items
            .iter()
            .find(|i| i.user_id == user_id && &i.line == line)
            .cloned())
    }

    async fn find_by_identifier(
        &self,
        user_id: UserId,
        identifier: &str,
    ) -> anyhow::Result<Option<CartItem>> {
        let items = self.items.lock().expect("cart lock poisoned");
        Ok(items
            .iter()
            .find(|i| {
                i.user_id == user_id
                    && (i.line.matches_identifier(identifier)
                        || i.id.to_string() == identifier)
            })
            .cloned())
    }

    async fn insert(&self, user_id: UserId, item: NewCartItem) -> anyhow::Result<CartItem> {
        let now = Utc::now();
        let created = CartItem {
            id: CartItemId::new(),
            user_id,
            line: item.line,
            category: item.category,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            image_url: item.image_url,
            created_at: now,
            updated_at: now,
        };
        self.items
            .lock()
            .expect("cart lock poisoned")
            .push(created.clone());
        Ok(created)
    }

    async fn set_quantity(&self, id: CartItemId, quantity: i64) -> anyhow::Result<CartItem> {
        let mut items = self.items.lock().expect("cart lock poisoned");
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| anyhow::anyhow!("cart item {} not found", id))?;
        item.quantity = quantity;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete(&self, id: CartItemId) -> anyhow::Result<()> {
        let mut items = self.items.lock().expect("cart lock poisoned");
        items.retain(|i| i.id != id);
        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> anyhow::Result<u64> {
        let mut items = self.items.lock().expect("cart lock poisoned");
        let before = items.len();
        items.retain(|i| i.user_id != user_id);
        Ok((before - items.len()) as u64)
    }
}
