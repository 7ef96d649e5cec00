use crate::pool::DbPool;
use async_trait::async_trait;
use services::{
    cart::ports::{CartItem, CartLine, CartRepository, NewCartItem},
    CartItemId, UserId,
};
use tokio_postgres::Row;

pub struct PostgresCartRepository {
    pool: DbPool,
}

impl PostgresCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const CART_COLUMNS: &str =
    "id, user_id, product_id, service_id, category, name, price, quantity, image_url, \
     created_at, updated_at";

/// Rebuild a cart row; exactly one of product_id / service_id is set,
/// enforced by a table check constraint
fn row_to_cart_item(row: &Row) -> anyhow::Result<CartItem> {
    let product_id: Option<String> = row.get(2);
    let service_id: Option<String> = row.get(3);

    let line = match (product_id, service_id) {
        (Some(product_id), None) => CartLine::Product { product_id },
        (None, Some(service_id)) => CartLine::Service { service_id },
        _ => anyhow::bail!("Cart row carries neither a product nor a service reference"),
    };

    Ok(CartItem {
        id: row.get(0),
        user_id: row.get(1),
        line,
        category: row.get(4),
        name: row.get(5),
        price: row.get(6),
        quantity: row.get(7),
        image_url: row.get(8),
        created_at: row.get(9),
        updated_at: row.get(10),
    })
}

#[async_trait]
impl CartRepository for PostgresCartRepository {
    async fn get_items(&self, user_id: UserId) -> anyhow::Result<Vec<CartItem>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM cart_items WHERE user_id = $1 ORDER BY created_at ASC",
                    CART_COLUMNS
                ),
                &[&user_id],
            )
            .await?;

        rows.iter().map(row_to_cart_item).collect()
    }

    async fn find_by_line(
        &self,
        user_id: UserId,
        line: &CartLine,
    ) -> anyhow::Result<Option<CartItem>> {
        let client = self.pool.get().await?;

        let row = match line {
            CartLine::Product { product_id } => {
                client
                    .query_opt(
                        &format!(
                            "SELECT {} FROM cart_items WHERE user_id = $1 AND product_id = $2",
                            CART_COLUMNS
                        ),
                        &[&user_id, &product_id],
                    )
                    .await?
            }
            CartLine::Service { service_id } => {
                client
                    .query_opt(
                        &format!(
                            "SELECT {} FROM cart_items WHERE user_id = $1 AND service_id = $2",
                            CART_COLUMNS
                        ),
                        &[&user_id, &service_id],
                    )
                    .await?
            }
        };

        row.as_ref().map(row_to_cart_item).transpose()
    }

    async fn find_by_identifier(
        &self,
        user_id: UserId,
        identifier: &str,
    ) -> anyhow::Result<Option<CartItem>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM cart_items \
                     WHERE user_id = $1 \
                       AND (product_id = $2 OR service_id = $2 OR id::text = $2) \
                     LIMIT 1",
                    CART_COLUMNS
                ),
                &[&user_id, &identifier],
            )
            .await?;

        row.as_ref().map(row_to_cart_item).transpose()
    }

    async fn insert(&self, user_id: UserId, item: NewCartItem) -> anyhow::Result<CartItem> {
        tracing::debug!(
            "Inserting cart row: user_id={}, name={}, quantity={}",
            user_id,
            item.name,
            item.quantity
        );

        let client = self.pool.get().await?;

        let product_id = item.line.product_id();
        let service_id = item.line.service_id();

        let row = client
            .query_one(
                &format!(
                    "INSERT INTO cart_items \
                     (user_id, product_id, service_id, category, name, price, quantity, image_url) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     RETURNING {}",
                    CART_COLUMNS
                ),
                &[
                    &user_id,
                    &product_id,
                    &service_id,
                    &item.category,
                    &item.name,
                    &item.price,
                    &item.quantity,
                    &item.image_url,
                ],
            )
            .await?;

        row_to_cart_item(&row)
    }

    async fn set_quantity(&self, id: CartItemId, quantity: i64) -> anyhow::Result<CartItem> {
        let client = self.pool.get().await?;

        let row = client
            .query_one(
                &format!(
                    "UPDATE cart_items SET quantity = $2, updated_at = now() \
                     WHERE id = $1 RETURNING {}",
                    CART_COLUMNS
                ),
                &[&id, &quantity],
            )
            .await?;

        row_to_cart_item(&row)
    }

    async fn delete(&self, id: CartItemId) -> anyhow::Result<()> {
        let client = self.pool.get().await?;

        client
            .execute("DELETE FROM cart_items WHERE id = $1", &[&id])
            .await?;

        Ok(())
    }

    async fn delete_all(&self, user_id: UserId) -> anyhow::Result<u64> {
        tracing::debug!("Clearing cart for user_id={}", user_id);

        let client = self.pool.get().await?;

        let deleted = client
            .execute("DELETE FROM cart_items WHERE user_id = $1", &[&user_id])
            .await?;

        Ok(deleted)
    }
}
