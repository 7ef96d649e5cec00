//! In-memory order repository for tests

use super::ports::{MainOrder, OrderRepository, ServiceOrder};
use crate::types::UserId;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

/// In-memory `OrderRepository`, for service and router tests
#[derive(Default)]
pub struct InMemoryOrderRepository {
    main_orders: Mutex<Vec<MainOrder>>,
    service_orders: Mutex<Vec<ServiceOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_main_orders(&self) -> Vec<MainOrder> {
        self.main_orders.lock().expect("order lock poisoned").clone()
    }

    pub fn all_service_orders(&self) -> Vec<ServiceOrder> {
        self.service_orders
            .lock()
            .expect("order lock poisoned")
            .clone()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn delete_unpaid_orders(&self, user_id: UserId) -> anyhow::Result<u64> {
        let mut mains = self.main_orders.lock().expect("order lock poisoned");
        let before = mains.len();
        mains.retain(|o| !(o.user_id == user_id && !o.is_paid));
        let removed = (before - mains.len()) as u64;

        let mut subs = self.service_orders.lock().expect("order lock poisoned");
        subs.retain(|o| !(o.user_id == user_id && !o.is_paid));

        Ok(removed)
    }

    async fn insert_main_order(&self, order: MainOrder) -> anyhow::Result<MainOrder> {
        self.main_orders
            .lock()
            .expect("order lock poisoned")
            .push(order.clone());
        Ok(order)
    }

    async fn insert_service_order(&self, order: ServiceOrder) -> anyhow::Result<ServiceOrder> {
        self.service_orders
            .lock()
            .expect("order lock poisoned")
            .push(order.clone());
        Ok(order)
    }

    async fn get_unpaid_main_orders(&self, user_id: UserId) -> anyhow::Result<Vec<MainOrder>> {
        let mains = self.main_orders.lock().expect("order lock poisoned");
        Ok(mains
            .iter()
            .filter(|o| o.user_id == user_id && !o.is_paid)
            .cloned()
            .collect())
    }

    async fn list_service_orders(&self, user_id: UserId) -> anyhow::Result<Vec<ServiceOrder>> {
        let subs = self.service_orders.lock().expect("order lock poisoned");
        let mut orders: Vec<ServiceOrder> = subs
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn mark_paid_by_user(&self, user_id: UserId) -> anyhow::Result<u64> {
        let now = Utc::now();
        let mut touched = 0u64;

        let mut mains = self.main_orders.lock().expect("order lock poisoned");
        for order in mains.iter_mut().filter(|o| o.user_id == user_id && !o.is_paid) {
            order.is_paid = true;
            order.status = "paid".to_string();
            order.updated_at = now;
            touched += 1;
        }

        let mut subs = self.service_orders.lock().expect("order lock poisoned");
        for order in subs.iter_mut().filter(|o| o.user_id == user_id && !o.is_paid) {
            order.is_paid = true;
            order.status = "paid".to_string();
            order.updated_at = now;
            touched += 1;
        }

        Ok(touched)
    }
}
