use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(uuid(Vehicles::Id).primary_key())
                    .col(uuid(Vehicles::UserId).not_null())
                    .col(string_len(Vehicles::Make, 64).not_null())
                    .col(string_len(Vehicles::Model, 64).not_null())
                    .col(integer(Vehicles::Year).not_null())
                    .col(string_len(Vehicles::LicensePlate, 32).not_null())
                    .col(string_len(Vehicles::Vin, 32).unique_key().not_null())
                    .col(timestamp_with_time_zone(Vehicles::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Vehicles::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_user")
                            .from(Vehicles::Table, Vehicles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Vehicles::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Vehicles { Table, Id, UserId, Make, Model, Year, LicensePlate, Vin, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
