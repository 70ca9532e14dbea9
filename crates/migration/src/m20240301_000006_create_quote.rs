use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(uuid(Quotes::Id).primary_key())
                    .col(uuid(Quotes::RequestId).not_null())
                    .col(uuid(Quotes::MechanicId).not_null())
                    .col(double(Quotes::Cost).not_null())
                    .col(string_len(Quotes::TimeRequired, 64).not_null())
                    .col(text_null(Quotes::PartsNeeded))
                    .col(string_len(Quotes::Availability, 255).not_null())
                    .col(string_len(Quotes::Status, 16).not_null().default("pending"))
                    .col(timestamp_with_time_zone(Quotes::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Quotes::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quote_request")
                            .from(Quotes::Table, Quotes::RequestId)
                            .to(ServiceRequests::Table, ServiceRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quote_mechanic")
                            .from(Quotes::Table, Quotes::MechanicId)
                            .to(Mechanics::Table, Mechanics::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Quotes::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Quotes { Table, Id, RequestId, MechanicId, Cost, TimeRequired, PartsNeeded, Availability, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum ServiceRequests { Table, Id }

#[derive(DeriveIden)]
enum Mechanics { Table, Id }
