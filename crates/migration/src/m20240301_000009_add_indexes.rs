//! Lookup indexes plus the unique indexes that back the lifecycle's at-most-one rules:
//! one quote per (request, mechanic), one booking per quote, one review per booking.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_vehicles_user_id")
                    .table(Vehicles::Table)
                    .col(Vehicles::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_requests_user_id")
                    .table(ServiceRequests::Table)
                    .col(ServiceRequests::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_requests_status")
                    .table(ServiceRequests::Table)
                    .col(ServiceRequests::Status)
                    .to_owned(),
            )
            .await?;

        // Quotes: at most one per (request, mechanic)
        manager
            .create_index(
                Index::create()
                    .name("uniq_quotes_request_mechanic")
                    .table(Quotes::Table)
                    .col(Quotes::RequestId)
                    .col(Quotes::MechanicId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Bookings: at most one per quote
        manager
            .create_index(
                Index::create()
                    .name("uniq_bookings_quote_id")
                    .table(Bookings::Table)
                    .col(Bookings::QuoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_client_id")
                    .table(Bookings::Table)
                    .col(Bookings::ClientId)
                    .to_owned(),
            )
            .await?;

        // Reviews: at most one per booking
        manager
            .create_index(
                Index::create()
                    .name("uniq_reviews_booking_id")
                    .table(Reviews::Table)
                    .col(Reviews::BookingId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_mechanic_id")
                    .table(Reviews::Table)
                    .col(Reviews::MechanicId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_vehicles_user_id").table(Vehicles::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_requests_user_id").table(ServiceRequests::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_requests_status").table(ServiceRequests::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_quotes_request_mechanic").table(Quotes::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_bookings_quote_id").table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bookings_client_id").table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_reviews_booking_id").table(Reviews::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_reviews_mechanic_id").table(Reviews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Vehicles { Table, UserId }

#[derive(DeriveIden)]
enum ServiceRequests { Table, UserId, Status }

#[derive(DeriveIden)]
enum Quotes { Table, RequestId, MechanicId }

#[derive(DeriveIden)]
enum Bookings { Table, QuoteId, ClientId }

#[derive(DeriveIden)]
enum Reviews { Table, BookingId, MechanicId }
