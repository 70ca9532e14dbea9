//! Create `bookings` table.
//!
//! `client_id` and `mechanic_id` are copied from the quote chain when the booking is made.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(uuid(Bookings::Id).primary_key())
                    .col(uuid(Bookings::QuoteId).not_null())
                    .col(uuid(Bookings::ClientId).not_null())
                    .col(uuid(Bookings::MechanicId).not_null())
                    .col(string_len(Bookings::ScheduledDate, 64).not_null())
                    .col(text_null(Bookings::Notes))
                    .col(string_len(Bookings::Status, 16).not_null().default("scheduled"))
                    .col(timestamp_with_time_zone_null(Bookings::CompletedAt))
                    .col(timestamp_with_time_zone(Bookings::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Bookings::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_quote")
                            .from(Bookings::Table, Bookings::QuoteId)
                            .to(Quotes::Table, Quotes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_client")
                            .from(Bookings::Table, Bookings::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_mechanic")
                            .from(Bookings::Table, Bookings::MechanicId)
                            .to(Mechanics::Table, Mechanics::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Bookings::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Bookings { Table, Id, QuoteId, ClientId, MechanicId, ScheduledDate, Notes, Status, CompletedAt, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Quotes { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Mechanics { Table, Id }
