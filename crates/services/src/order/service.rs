use super::ports::{
    MainOrder, OrderError, OrderItem, OrderRepository, OrderService, PlacedOrder, ServiceOrder,
    ORDER_STATUS_PENDING,
};
use crate::cart::ports::{CartItem, CartRepository};
use crate::types::{OrderId, ServiceOrderId, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

pub struct OrderServiceImpl {
    cart_repo: Arc<dyn CartRepository>,
    order_repo: Arc<dyn OrderRepository>,
}

impl OrderServiceImpl {
    pub fn new(cart_repo: Arc<dyn CartRepository>, order_repo: Arc<dyn OrderRepository>) -> Self {
        Self {
            cart_repo,
            order_repo,
        }
    }
}

/// Partition cart rows by service reference. Product-only rows group
/// under the `None` key. First-seen key order is preserved so the
/// resulting service orders come out in a stable order.
fn group_by_service(items: &[CartItem]) -> Vec<(Option<String>, Vec<&CartItem>)> {
    let mut keys: Vec<Option<String>> = Vec::new();
    let mut groups: HashMap<Option<String>, Vec<&CartItem>> = HashMap::new();

    for item in items {
        let key = item.line.service_id().map(str::to_string);
        if !groups.contains_key(&key) {
            keys.push(key.clone());
        }
        groups.entry(key).or_default().push(item);
    }

    keys.into_iter()
        .map(|key| {
            let group = groups.remove(&key).unwrap_or_default();
            (key, group)
        })
        .collect()
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    async fn place_order(&self, user_id: UserId) -> Result<PlacedOrder, OrderError> {
        tracing::info!("Placing order for user_id={}", user_id);

        let cart_items = self
            .cart_repo
            .get_items(user_id)
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;

        if cart_items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        // At-most-one-active-order policy: abandoned checkouts leave no history
        let removed = self
            .order_repo
            .delete_unpaid_orders(user_id)
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;
        if removed > 0 {
            tracing::info!(
                "Deleted {} prior unpaid order(s) for user_id={}",
                removed,
                user_id
            );
        }

        let subtotal: i64 = cart_items.iter().map(|i| i.price * i.quantity).sum();
        let item_count: i64 = cart_items.iter().map(|i| i.quantity).sum();

        let now = Utc::now();
        let main_order = self
            .order_repo
            .insert_main_order(MainOrder {
                id: OrderId::new(),
                user_id,
                item_count,
                subtotal,
                is_paid: false,
                status: ORDER_STATUS_PENDING.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;

        let mut service_orders = Vec::new();
        for (service_id, group) in group_by_service(&cart_items) {
            let items: Vec<OrderItem> = group.iter().map(|i| OrderItem::from_cart_item(i)).collect();
            let group_subtotal: i64 = items.iter().map(|i| i.line_total).sum();
            let group_count: i64 = items.iter().map(|i| i.quantity).sum();

            let service_order = self
                .order_repo
                .insert_service_order(ServiceOrder {
                    id: ServiceOrderId::new(),
                    main_order_id: main_order.id,
                    user_id,
                    service_id,
                    items,
                    item_count: group_count,
                    subtotal: group_subtotal,
                    is_paid: false,
                    status: ORDER_STATUS_PENDING.to_string(),
                    sub_details: None,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .map_err(|e| OrderError::DatabaseError(e.to_string()))?;
            service_orders.push(service_order);
        }

        tracing::info!(
            "Order placed: user_id={}, main_order_id={}, service_orders={}, subtotal={}",
            user_id,
            main_order.id,
            service_orders.len(),
            main_order.subtotal
        );

        // The cart is intentionally left intact: only a successful payment
        // webhook clears it, so checkout can be re-attempted.
        Ok(PlacedOrder {
            main_order,
            service_orders,
        })
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<ServiceOrder>, OrderError> {
        tracing::debug!("Listing orders for user_id={}", user_id);

        let orders = self
            .order_repo
            .list_service_orders(user_id)
            .await
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;

        Ok(orders)
    }
}
