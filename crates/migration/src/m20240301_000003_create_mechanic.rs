//! Create `mechanics` table: the service-provider profile attached to a mechanic user.
//!
//! `rating` is a cached average over the mechanic's reviews; null until the first review.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mechanics::Table)
                    .if_not_exists()
                    .col(uuid(Mechanics::Id).primary_key())
                    .col(uuid(Mechanics::UserId).unique_key().not_null())
                    .col(string_len_null(Mechanics::Certification, 255))
                    .col(string_len_null(Mechanics::Specialization, 255))
                    .col(string_len_null(Mechanics::ServiceArea, 255))
                    .col(double_null(Mechanics::Rate))
                    .col(boolean(Mechanics::Verified).default(false))
                    .col(string_len_null(Mechanics::Availability, 255))
                    .col(double_null(Mechanics::Rating))
                    .col(integer(Mechanics::ReviewCount).default(0))
                    .col(timestamp_with_time_zone(Mechanics::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Mechanics::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mechanic_user")
                            .from(Mechanics::Table, Mechanics::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Mechanics::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Mechanics {
    Table,
    Id,
    UserId,
    Certification,
    Specialization,
    ServiceArea,
    Rate,
    Verified,
    Availability,
    Rating,
    ReviewCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users { Table, Id }
