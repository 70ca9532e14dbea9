#![cfg(test)]
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::connect_with_config;
use models::user::Role;
use uuid::Uuid;

use crate::policy::Caller;

/// A private in-memory database per test, migrated up.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = configs::DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn client(db: &DatabaseConnection, email: &str) -> Result<Caller, anyhow::Error> {
    let u = models::user::create(db, "Test Client", email, Role::Client, "555-0100").await?;
    Ok(Caller::new(u.id, Role::Client))
}

/// A mechanic user with their profile; returns the caller and the profile id.
pub async fn mechanic(db: &DatabaseConnection, email: &str) -> Result<(Caller, Uuid), anyhow::Error> {
    let u = models::user::create(db, "Test Mechanic", email, Role::Mechanic, "555-0199").await?;
    let m = models::mechanic::create(db, u.id, models::mechanic::Profile::default()).await?;
    Ok((Caller::new(u.id, Role::Mechanic), m.id))
}
