use super::ports::{
    CartError, CartItem, CartRepository, CartService, CartUpdate, NewCartItem,
};
use crate::UserId;
use async_trait::async_trait;
use std::sync::Arc;

pub struct CartServiceImpl {
    cart_repo: Arc<dyn CartRepository>,
}

impl CartServiceImpl {
    pub fn new(cart_repo: Arc<dyn CartRepository>) -> Self {
        Self { cart_repo }
    }
}

/// Validate an incoming cart item, returning the first failing message
fn validate_new_item(item: &NewCartItem) -> Result<(), CartError> {
    if item.name.trim().is_empty() {
        return Err(CartError::Validation("name is required".to_string()));
    }
    if item.category.trim().is_empty() {
        return Err(CartError::Validation("category is required".to_string()));
    }
    if item.price < 0 {
        return Err(CartError::Validation(
            "price must not be negative".to_string(),
        ));
    }
    if item.quantity < 1 {
        return Err(CartError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl CartService for CartServiceImpl {
    async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartItem>, CartError> {
        tracing::debug!("Fetching cart for user_id={}", user_id);

        let items = self
            .cart_repo
            .get_items(user_id)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?;

        Ok(items)
    }

    async fn add_item(&self, user_id: UserId, item: NewCartItem) -> Result<CartItem, CartError> {
        validate_new_item(&item)?;

        tracing::debug!(
            "Adding cart item for user_id={}: name={}, quantity={}",
            user_id,
            item.name,
            item.quantity
        );

        // Repeat add of the same product/service merges into the existing row
        if let Some(existing) = self
            .cart_repo
            .find_by_line(user_id, &item.line)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?
        {
            let merged = self
                .cart_repo
                .set_quantity(existing.id, existing.quantity + item.quantity)
                .await
                .map_err(|e| CartError::DatabaseError(e.to_string()))?;

            tracing::info!(
                "Merged cart item: user_id={}, item_id={}, quantity={}",
                user_id,
                merged.id,
                merged.quantity
            );
            return Ok(merged);
        }

        let created = self
            .cart_repo
            .insert(user_id, item)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "Inserted cart item: user_id={}, item_id={}",
            user_id,
            created.id
        );
        Ok(created)
    }

    async fn remove_item(&self, user_id: UserId, identifier: &str) -> Result<(), CartError> {
        let item = self
            .cart_repo
            .find_by_identifier(user_id, identifier)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?
            .ok_or(CartError::NotFound)?;

        self.cart_repo
            .delete(item.id)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "Removed cart item: user_id={}, item_id={}, identifier={}",
            user_id,
            item.id,
            identifier
        );
        Ok(())
    }

    async fn update_quantity(
        &self,
        user_id: UserId,
        identifier: &str,
        quantity: i64,
    ) -> Result<CartUpdate, CartError> {
        let item = self
            .cart_repo
            .find_by_identifier(user_id, identifier)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?
            .ok_or(CartError::NotFound)?;

        // Non-positive quantity is equivalent to removal
        if quantity <= 0 {
            self.cart_repo
                .delete(item.id)
                .await
                .map_err(|e| CartError::DatabaseError(e.to_string()))?;

            tracing::info!(
                "Removed cart item via zero-quantity update: user_id={}, item_id={}",
                user_id,
                item.id
            );
            return Ok(CartUpdate::Removed);
        }

        let updated = self
            .cart_repo
            .set_quantity(item.id, quantity)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "Updated cart quantity: user_id={}, item_id={}, quantity={}",
            user_id,
            updated.id,
            updated.quantity
        );
        Ok(CartUpdate::Updated(updated))
    }

    async fn sync_cart(
        &self,
        user_id: UserId,
        client_items: Vec<NewCartItem>,
    ) -> Result<Vec<CartItem>, CartError> {
        tracing::debug!(
            "Syncing cart for user_id={}: {} client items",
            user_id,
            client_items.len()
        );

        for client_item in client_items {
            validate_new_item(&client_item)?;

            match self
                .cart_repo
                .find_by_line(user_id, &client_item.line)
                .await
                .map_err(|e| CartError::DatabaseError(e.to_string()))?
            {
                // Conflict: keep the larger of the two quantities
                Some(existing) if client_item.quantity > existing.quantity => {
                    self.cart_repo
                        .set_quantity(existing.id, client_item.quantity)
                        .await
                        .map_err(|e| CartError::DatabaseError(e.to_string()))?;
                }
                Some(_) => {}
                None => {
                    self.cart_repo
                        .insert(user_id, client_item)
                        .await
                        .map_err(|e| CartError::DatabaseError(e.to_string()))?;
                }
            }
        }

        let merged = self
            .cart_repo
            .get_items(user_id)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?;

        tracing::info!(
            "Cart synced: user_id={}, {} rows after merge",
            user_id,
            merged.len()
        );
        Ok(merged)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64, CartError> {
        let deleted = self
            .cart_repo
            .delete_all(user_id)
            .await
            .map_err(|e| CartError::DatabaseError(e.to_string()))?;

        tracing::info!("Cleared cart: user_id={}, deleted={}", user_id, deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::ports::CartLine;
    use crate::cart::test_helpers::InMemoryCartRepository;

    fn product_item(product_id: &str, price: i64, quantity: i64) -> NewCartItem {
        NewCartItem {
            line: CartLine::Product {
                product_id: product_id.to_string(),
            },
            category: "clothing".to_string(),
            name: format!("product {}", product_id),
            price,
            quantity,
            image_url: None,
        }
    }

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

    fn service() -> (CartServiceImpl, Arc<InMemoryCartRepository>) {
        let repo = Arc::new(InMemoryCartRepository::new());
        (CartServiceImpl::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_add_same_product_twice_merges_quantities() {
        let (service, _) = service();
        let user_id = UserId::new();

        service
            .add_item(user_id, product_item("p1", 1000, 2))
            .await
            .unwrap();
        let merged = service
            .add_item(user_id, product_item("p1", 1000, 3))
            .await
            .unwrap();

        assert_eq!(merged.quantity, 5);
        let cart = service.get_cart(user_id).await.unwrap();
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_add_distinct_lines_creates_rows() {
        let (service, _) = service();
        let user_id = UserId::new();

        service
            .add_item(user_id, product_item("p1", 1000, 1))
            .await
            .unwrap();
        service
            .add_item(user_id, service_item("s1", 500, 1))
            .await
            .unwrap();

        let cart = service.get_cart(user_id).await.unwrap();
        assert_eq!(cart.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_missing_name() {
        let (service, _) = service();
        let mut item = product_item("p1", 1000, 1);
        item.name = "  ".to_string();

        let err = service.add_item(UserId::new(), item).await.unwrap_err();
        match err {
            CartError::Validation(msg) => assert_eq!(msg, "name is required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let (service, _) = service();
        let err = service
            .add_item(UserId::new(), product_item("p1", 1000, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }

    #[tokio::test]
    async fn test_remove_by_product_id() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 1))
            .await
            .unwrap();

        service.remove_item(user_id, "p1").await.unwrap();
        assert!(service.get_cart(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_by_row_uuid() {
        let (service, _) = service();
        let user_id = UserId::new();
        let created = service
            .add_item(user_id, service_item("s1", 500, 1))
            .await
            .unwrap();

        service
            .remove_item(user_id, &created.id.to_string())
            .await
            .unwrap();
        assert!(service.get_cart(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_identifier_is_not_found() {
        let (service, _) = service();
        let err = service
            .remove_item(UserId::new(), "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::NotFound));
    }

    #[tokio::test]
    async fn test_update_quantity_zero_is_equivalent_to_remove() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 2))
            .await
            .unwrap();

        let outcome = service.update_quantity(user_id, "p1", 0).await.unwrap();
        assert!(matches!(outcome, CartUpdate::Removed));
        assert!(service.get_cart(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_overwrites() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 2))
            .await
            .unwrap();

        let outcome = service.update_quantity(user_id, "p1", 7).await.unwrap();
        match outcome {
            CartUpdate::Updated(item) => assert_eq!(item.quantity, 7),
            CartUpdate::Removed => panic!("expected updated row"),
        }
    }

    #[tokio::test]
    async fn test_sync_keeps_larger_quantity_not_sum() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 1))
            .await
            .unwrap();

        let merged = service
            .sync_cart(user_id, vec![product_item("p1", 1000, 3)])
            .await
            .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_sync_keeps_server_quantity_when_larger() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 5))
            .await
            .unwrap();

        let merged = service
            .sync_cart(user_id, vec![product_item("p1", 1000, 2)])
            .await
            .unwrap();

        assert_eq!(merged[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_sync_inserts_unmatched_client_items() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 1))
            .await
            .unwrap();

        let merged = service
            .sync_cart(user_id, vec![service_item("s1", 500, 2)])
            .await
            .unwrap();

        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_then_get_returns_empty() {
        let (service, _) = service();
        let user_id = UserId::new();
        service
            .add_item(user_id, product_item("p1", 1000, 1))
            .await
            .unwrap();
        service
            .add_item(user_id, service_item("s1", 500, 1))
            .await
            .unwrap();

        let deleted = service.clear_cart(user_id).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(service.get_cart(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_does_not_touch_other_users() {
        let (service, _) = service();
        let user_a = UserId::new();
        let user_b = UserId::new();
        service
            .add_item(user_a, product_item("p1", 1000, 1))
            .await
            .unwrap();
        service
            .add_item(user_b, product_item("p2", 1000, 1))
            .await
            .unwrap();

        service.clear_cart(user_a).await.unwrap();
        assert_eq!(service.get_cart(user_b).await.unwrap().len(), 1);
    }
}
