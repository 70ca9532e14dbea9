/// Database connection and configuration tests
pub mod db_tests;



use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;

/// Fresh in-memory SQLite database with every migration applied.
pub(crate) async fn setup_test_db() -> Result<DatabaseConnection> {
    let cfg = configs::DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = crate::db::connect_with_config(&cfg).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Client, mechanic and a vehicle owned by the client.
pub(crate) struct Fixture {
    pub client: crate::user::Model,
    pub mechanic_user: crate::user::Model,
    pub mechanic: crate::mechanic::Model,
    pub vehicle: crate::vehicle::Model,
}

pub(crate) async fn fixture(db: &DatabaseConnection) -> Result<Fixture> {
    use crate::{mechanic, user, vehicle};
    let client = user::create(db, "Casey Client", "casey@example.com", user::Role::Client, "555-0100").await?;
    let mechanic_user = user::create(db, "Max Mechanic", "max@example.com", user::Role::Mechanic, "555-0199").await?;
    let mechanic = mechanic::create(db, mechanic_user.id, mechanic::Profile::default()).await?;
    let vehicle = vehicle::create(
        db,
        client.id,
        vehicle::NewVehicle { make: "Honda", model: "Civic", year: 2015, license_plate: "abc123", vin: "1HGCM82633A004352" },
    )
    .await?;
    Ok(Fixture { client, mechanic_user, mechanic, vehicle })
}
