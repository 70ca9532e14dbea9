use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use configs::{DatabaseConfig, DEFAULT_DATABASE_URL};

/// Connects with default pool settings, honouring `DATABASE_URL` when set.
pub async fn connect() -> anyhow::Result<DatabaseConnection> {
    let mut cfg = DatabaseConfig::default();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        cfg.url = url;
    }
    connect_with_config(&cfg).await
}

pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let url = if cfg.url.trim().is_empty() { DEFAULT_DATABASE_URL } else { cfg.url.as_str() };
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opt).await?;
    tracing::debug!(backend = ?db.get_database_backend(), "database connected");
    Ok(db)
}
