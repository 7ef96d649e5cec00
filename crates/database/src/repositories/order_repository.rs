use crate::pool::DbPool;
use async_trait::async_trait;
use services::{
    order::ports::{MainOrder, OrderRepository, ServiceOrder},
    UserId,
};
use tokio_postgres::Row;

pub struct PostgresOrderRepository {
    pool: DbPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_main_order(row: &Row) -> MainOrder {
    MainOrder {
        id: row.get(0),
        user_id: row.get(1),
        item_count: row.get(2),
        subtotal: row.get(3),
        is_paid: row.get(4),
        status: row.get(5),
        created_at: row.get(6),
        updated_at: row.get(7),
    }
}

fn row_to_service_order(row: &Row) -> anyhow::Result<ServiceOrder> {
    let items: serde_json::Value = row.get(4);

    Ok(ServiceOrder {
        id: row.get(0),
        main_order_id: row.get(1),
        user_id: row.get(2),
        service_id: row.get(3),
        items: serde_json::from_value(items)?,
        item_count: row.get(5),
        subtotal: row.get(6),
        is_paid: row.get(7),
        status: row.get(8),
        sub_details: row.get(9),
        created_at: row.get(10),
        updated_at: row.get(11),
    })
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn delete_unpaid_orders(&self, user_id: UserId) -> anyhow::Result<u64> {
        tracing::debug!("Deleting unpaid orders for user_id={}", user_id);

        let client = self.pool.get().await?;

        // Service orders cascade from main_orders
        let deleted = client
            .execute(
                "DELETE FROM main_orders WHERE user_id = $1 AND is_paid = FALSE",
                &[&user_id],
            )
            .await?;

        Ok(deleted)
    }

    async fn insert_main_order(&self, order: MainOrder) -> anyhow::Result<MainOrder> {
        tracing::debug!(
            "Inserting main order: id={}, user_id={}, subtotal={}",
            order.id,
            order.user_id,
            order.subtotal
        );

        let client = self.pool.get().await?;

        client
            .execute(
                "INSERT INTO main_orders \
                 (id, user_id, item_count, subtotal, is_paid, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &order.id,
                    &order.user_id,
                    &order.item_count,
                    &order.subtotal,
                    &order.is_paid,
                    &order.status,
                    &order.created_at,
                    &order.updated_at,
                ],
            )
            .await?;

        Ok(order)
    }

    async fn insert_service_order(&self, order: ServiceOrder) -> anyhow::Result<ServiceOrder> {
        tracing::debug!(
            "Inserting service order: id={}, main_order_id={}, service_id={:?}",
            order.id,
            order.main_order_id,
            order.service_id
        );

        let client = self.pool.get().await?;

        let items = serde_json::to_value(&order.items)?;

        client
            .execute(
                "INSERT INTO service_orders \
                 (id, main_order_id, user_id, service_id, items, item_count, subtotal, \
                  is_paid, status, sub_details, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                &[
                    &order.id,
                    &order.main_order_id,
                    &order.user_id,
                    &order.service_id,
                    &items,
                    &order.item_count,
                    &order.subtotal,
                    &order.is_paid,
                    &order.status,
                    &order.sub_details,
                    &order.created_at,
                    &order.updated_at,
                ],
            )
            .await?;

        Ok(order)
    }

    async fn get_unpaid_main_orders(&self, user_id: UserId) -> anyhow::Result<Vec<MainOrder>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, user_id, item_count, subtotal, is_paid, status, created_at, updated_at \
                 FROM main_orders \
                 WHERE user_id = $1 AND is_paid = FALSE \
                 ORDER BY created_at DESC",
                &[&user_id],
            )
            .await?;

        Ok(rows.iter().map(row_to_main_order).collect())
    }

    async fn list_service_orders(&self, user_id: UserId) -> anyhow::Result<Vec<ServiceOrder>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, main_order_id, user_id, service_id, items, item_count, subtotal, \
                        is_paid, status, sub_details, created_at, updated_at \
                 FROM service_orders \
                 WHERE user_id = $1 \
                 ORDER BY created_at DESC",
                &[&user_id],
            )
            .await?;

        rows.iter().map(row_to_service_order).collect()
    }

    async fn mark_paid_by_user(&self, user_id: UserId) -> anyhow::Result<u64> {
        tracing::info!("Marking orders paid for user_id={}", user_id);

        let client = self.pool.get().await?;

        let mains = client
            .execute(
                "UPDATE main_orders SET is_paid = TRUE, status = 'paid', updated_at = now() \
                 WHERE user_id = $1 AND is_paid = FALSE",
                &[&user_id],
            )
            .await?;

        let subs = client
            .execute(
                "UPDATE service_orders SET is_paid = TRUE, status = 'paid', updated_at = now() \
                 WHERE user_id = $1 AND is_paid = FALSE",
                &[&user_id],
            )
            .await?;

        Ok(mains + subs)
    }
}
