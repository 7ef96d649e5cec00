use crate::pool::DbPool;
use async_trait::async_trait;
use services::{
    auth::ports::{User, UserRepository},
    UserId,
};
use tokio_postgres::Row;

pub struct PostgresUserRepository {
    pool: DbPool,
}

impl PostgresUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &Row) -> User {
    User {
        id: row.get(0),
        email: row.get(1),
        name: row.get(2),
        created_at: row.get(3),
        updated_at: row.get(4),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user(&self, user_id: UserId) -> anyhow::Result<Option<User>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, email, name, created_at, updated_at \
                 FROM users \
                 WHERE id = $1",
                &[&user_id],
            )
            .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    async fn get_or_create_by_email(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> anyhow::Result<User> {
        let client = self.pool.get().await?;

        if let Some(row) = client
            .query_opt(
                "SELECT id, email, name, created_at, updated_at \
                 FROM users \
                 WHERE email = $1",
                &[&email],
            )
            .await?
        {
            return Ok(row_to_user(&row));
        }

        tracing::info!("Creating user for email={}", email);

        let row = client
            .query_one(
                "INSERT INTO users (email, name) \
                 VALUES ($1, $2) \
                 RETURNING id, email, name, created_at, updated_at",
                &[&email, &name],
            )
            .await?;

        Ok(row_to_user(&row))
    }
}
