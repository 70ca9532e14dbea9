//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_user;
mod m20240301_000002_create_user_credentials;
mod m20240301_000003_create_mechanic;
mod m20240301_000004_create_vehicle;
mod m20240301_000005_create_service_request;
mod m20240301_000006_create_quote;
mod m20240301_000007_create_booking;
mod m20240301_000008_create_review;
mod m20240301_000009_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_user::Migration),
            Box::new(m20240301_000002_create_user_credentials::Migration),
            Box::new(m20240301_000003_create_mechanic::Migration),
            Box::new(m20240301_000004_create_vehicle::Migration),
            Box::new(m20240301_000005_create_service_request::Migration),
            Box::new(m20240301_000006_create_quote::Migration),
            Box::new(m20240301_000007_create_booking::Migration),
            Box::new(m20240301_000008_create_review::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000009_add_indexes::Migration),
        ]
    }
}
