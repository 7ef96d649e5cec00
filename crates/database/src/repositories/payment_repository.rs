use crate::pool::DbPool;
use async_trait::async_trait;
use services::{
    payment::ports::{Payment, PaymentRepository},
    UserId,
};

pub struct PostgresPaymentRepository {
    pool: DbPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn insert_payment(&self, payment: Payment) -> anyhow::Result<Payment> {
        tracing::debug!(
            "Inserting payment: id={}, user_id={}, amount={}",
            payment.id,
            payment.user_id,
            payment.amount
        );

        let client = self.pool.get().await?;

        client
            .execute(
                "INSERT INTO payments \
                 (id, user_id, product_id, service_id, amount, provider_payment_id, \
                  status, currency, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                &[
                    &payment.id,
                    &payment.user_id,
                    &payment.product_id,
                    &payment.service_id,
                    &payment.amount,
                    &payment.provider_payment_id,
                    &payment.status,
                    &payment.currency,
                    &payment.created_at,
                ],
            )
            .await?;

        Ok(payment)
    }

    async fn list_payments(&self, user_id: UserId) -> anyhow::Result<Vec<Payment>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                "SELECT id, user_id, product_id, service_id, amount, provider_payment_id, \
                        status, currency, created_at \
                 FROM payments \
                 WHERE user_id = $1 \
                 ORDER BY created_at DESC",
                &[&user_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| Payment {
                id: r.get(0),
                user_id: r.get(1),
                product_id: r.get(2),
                service_id: r.get(3),
                amount: r.get(4),
                provider_payment_id: r.get(5),
                status: r.get(6),
                currency: r.get(7),
                created_at: r.get(8),
            })
            .collect())
    }
}
