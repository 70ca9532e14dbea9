use std::net::SocketAddr;

use axum::Router;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Connect to the configured database, apply pending migrations and wire the auth service.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    common::env::ensure_sqlite_dir(&cfg.database.url).await?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(format!("migrations failed: {e}")))?;

    if cfg.auth.uses_dev_secret() {
        warn!("JWT_SECRET not set; using the development secret");
    }
    Ok(ServerState::new(db, service::auth::AuthConfig::from(&cfg.auth)))
}

/// The full application, ready to serve or to drive from tests.
pub fn app(state: ServerState) -> Router {
    routes::build_router(build_cors(), state)
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Public entry: load config, build the app and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load_or_default()?;
    run_with_config(cfg).await
}

pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = app(state);

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "mechconnect api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_garbage_host() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn build_state_migrates_in_memory_sqlite() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "sqlite::memory:".into();
        cfg.database.max_connections = 1;
        cfg.auth.jwt_secret = "test-secret".into();
        let state = build_state(&cfg).await.expect("state");
        assert!(state.auth.verify_token("garbage").is_err());
    }
}
