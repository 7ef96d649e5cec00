use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

/// Connection pool type alias
pub type DbPool = Pool;

/// Create a connection pool from database configuration
pub fn create_pool(config: &config::DatabaseConfig) -> anyhow::Result<Pool> {
    info!(
        "Creating database pool: host={}, port={}, database={}, max_connections={}",
        config.host, config.port, config.database, config.max_connections
    );

    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.dbname = Some(config.database.clone());
    cfg.user = Some(config.username.clone());
    cfg.password = Some(config.password.clone());
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(
        config.max_connections as usize,
    ));

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))
}
