//! Create `service_requests` table with FKs to `users` (owner) and `vehicles`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceRequests::Table)
                    .if_not_exists()
                    .col(uuid(ServiceRequests::Id).primary_key())
                    .col(uuid(ServiceRequests::UserId).not_null())
                    .col(uuid(ServiceRequests::VehicleId).not_null())
                    .col(string_len(ServiceRequests::ServiceType, 128).not_null())
                    .col(text(ServiceRequests::Description).not_null())
                    .col(string_len(ServiceRequests::Location, 255).not_null())
                    .col(string_len(ServiceRequests::Urgency, 32).not_null())
                    .col(string_len(ServiceRequests::PreferredDate, 64).not_null())
                    .col(text_null(ServiceRequests::Photo))
                    .col(string_len(ServiceRequests::Status, 16).not_null().default("open"))
                    .col(timestamp_with_time_zone(ServiceRequests::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ServiceRequests::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_user")
                            .from(ServiceRequests::Table, ServiceRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_vehicle")
                            .from(ServiceRequests::Table, ServiceRequests::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceRequests::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceRequests {
    Table,
    Id,
    UserId,
    VehicleId,
    ServiceType,
    Description,
    Location,
    Urgency,
    PreferredDate,
    Photo,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Vehicles { Table, Id }
