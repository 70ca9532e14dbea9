//! Bookings: turning an accepted quote into scheduled work and driving it to completion.
//!
//! Every status change runs in one transaction together with the request status it implies,
//! so a request and its booking never disagree.

use std::collections::HashSet;

use uuid::Uuid;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::lifecycle::{BookingStatus, QuoteStatus, RequestEvent, RequestStatus};
use models::{booking, quote, review, service_request};

use crate::errors::ServiceError;
use crate::mechanic_service::{profile_of, user_of};
use crate::policy::{authorize, can_view, Action, Caller, Ownership};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBooking {
    pub quote_id: Option<Uuid>,
    #[serde(default)]
    pub scheduled_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBooking {
    pub scheduled_date: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub has_review: bool,
}

async fn reviewed(db: &DatabaseConnection, ids: Vec<Uuid>) -> Result<HashSet<Uuid>, ServiceError> {
    let rows: Vec<Uuid> = review::Entity::find()
        .select_only()
        .column(review::Column::BookingId)
        .filter(review::Column::BookingId.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

async fn ownership<C: ConnectionTrait>(db: &C, b: &booking::Model) -> Result<Ownership, ServiceError> {
    Ok(Ownership::both(b.client_id, user_of(db, b.mechanic_id).await?))
}

/// Moves the booking's request by `event` and saves it.
async fn move_request<C: ConnectionTrait>(db: &C, request_id: Uuid, event: RequestEvent) -> Result<RequestStatus, ServiceError> {
    let request = service_request::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;
    let from = request.status;
    let next = from.apply(event)?;
    let mut am: service_request::ActiveModel = request.into();
    am.status = Set(next);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    info!(event = "request_status_changed", request_id = %request_id, from = from.as_str(), to = next.as_str(), "service request moved");
    Ok(next)
}

async fn request_id_of<C: ConnectionTrait>(db: &C, quote_id: Uuid) -> Result<Uuid, ServiceError> {
    quote::Entity::find_by_id(quote_id)
        .one(db)
        .await?
        .map(|q| q.request_id)
        .ok_or_else(|| ServiceError::not_found("quote"))
}

/// Clients see bookings on their requests; mechanics see bookings on their quotes.
pub async fn list(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<BookingSummary>, ServiceError> {
    let query = booking::Entity::find()
        .order_by_desc(booking::Column::ScheduledDate)
        .order_by_desc(booking::Column::CreatedAt);
    let rows = if caller.is_client() {
        query.filter(booking::Column::ClientId.eq(caller.user_id)).all(db).await?
    } else {
        let me = profile_of(db, caller).await?;
        query.filter(booking::Column::MechanicId.eq(me.id)).all(db).await?
    };
    let done = reviewed(db, rows.iter().map(|b| b.id).collect()).await?;
    Ok(rows
        .into_iter()
        .map(|b| {
            let has_review = done.contains(&b.id);
            BookingSummary { booking: b, has_review }
        })
        .collect())
}

pub async fn get(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<BookingSummary, ServiceError> {
    let b = booking::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    if !can_view(caller, &ownership(db, &b).await?) {
        return Err(ServiceError::not_found("booking"));
    }
    let has_review = review::Entity::find().filter(review::Column::BookingId.eq(id)).count(db).await? > 0;
    Ok(BookingSummary { booking: b, has_review })
}

/// Book an accepted quote on an open request; the request moves to in_progress.
#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn create(db: &DatabaseConnection, caller: &Caller, input: CreateBooking) -> Result<booking::Model, ServiceError> {
    let quote_id = input.quote_id.ok_or_else(|| ServiceError::Validation("quote_id required".into()))?;
    models::vehicle::validate_required("scheduled_date", &input.scheduled_date)?;

    let txn = db.begin().await?;
    let q = quote::Entity::find_by_id(quote_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("quote"))?;
    let request = service_request::Entity::find_by_id(q.request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;
    authorize(caller, Action::CreateBooking, &Ownership::client(request.user_id))?;

    if q.status != QuoteStatus::Accepted {
        return Err(ServiceError::invalid_state(format!("cannot book a quote that is {}", q.status.as_str())));
    }
    if request.status != RequestStatus::Open {
        return Err(ServiceError::invalid_state(format!(
            "cannot book a request that is {}",
            request.status.as_str()
        )));
    }
    let existing = booking::Entity::find().filter(booking::Column::QuoteId.eq(quote_id)).count(&txn).await?;
    if existing > 0 {
        return Err(ServiceError::invalid_state("this quote is already booked"));
    }

    let created = booking::create(
        &txn,
        booking::NewBooking {
            quote_id,
            client_id: request.user_id,
            mechanic_id: q.mechanic_id,
            scheduled_date: &input.scheduled_date,
            notes: input.notes.as_deref(),
        },
    )
    .await
    .map_err(|e| ServiceError::from(e).conflict_as_invalid_state("this quote is already booked"))?;
    move_request(&txn, request.id, RequestEvent::Booked).await?;
    txn.commit().await?;
    info!(event = "booking_created", booking_id = %created.id, quote_id = %quote_id, "booking created");
    Ok(created)
}

/// Edit details or move the status; status moves carry the request along.
#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn update(db: &DatabaseConnection, caller: &Caller, id: Uuid, input: UpdateBooking) -> Result<booking::Model, ServiceError> {
    let target = input.status.as_deref().map(BookingStatus::parse).transpose()?;
    let has_details = input.scheduled_date.is_some() || input.notes.is_some();
    if !has_details && target.is_none() {
        return Err(ServiceError::Validation("no updates provided".into()));
    }

    let txn = db.begin().await?;
    let found = booking::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    let owners = ownership(&txn, &found).await?;
    authorize(caller, Action::EditBooking, &owners)?;

    let from = found.status;
    if from.is_terminal() {
        return Err(ServiceError::invalid_state(format!("booking is {}", from.as_str())));
    }
    let quote_id = found.quote_id;
    let mut am: booking::ActiveModel = found.into();

    if let Some(date) = input.scheduled_date {
        models::vehicle::validate_required("scheduled_date", &date)?;
        am.scheduled_date = Set(date.trim().to_string());
    }
    if let Some(notes) = input.notes {
        am.notes = Set(Some(notes));
    }

    if let Some(target) = target.filter(|t| *t != from) {
        let action = match target {
            BookingStatus::Completed => Action::CompleteBooking,
            BookingStatus::Cancelled => Action::CancelBooking,
            BookingStatus::InProgress => Action::StartBooking,
            BookingStatus::Scheduled => Action::EditBooking,
        };
        authorize(caller, action, &owners)?;
        let next = from.advance(target)?;
        am.status = Set(next);
        if next == BookingStatus::Completed {
            am.completed_at = Set(Some(Utc::now().into()));
        }
        if let Some(event) = next.request_event() {
            let request_id = request_id_of(&txn, quote_id).await?;
            move_request(&txn, request_id, event).await?;
        }
        info!(event = "booking_status_changed", booking_id = %id, from = from.as_str(), to = next.as_str(), "booking moved");
    }

    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Remove a scheduled, unreviewed booking; the request reopens.
#[instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = booking::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    authorize(caller, Action::DeleteBooking, &Ownership::client(found.client_id))?;
    if found.status != BookingStatus::Scheduled {
        return Err(ServiceError::invalid_state(format!(
            "cannot delete a booking that is {}",
            found.status.as_str()
        )));
    }
    let reviews = review::Entity::find().filter(review::Column::BookingId.eq(id)).count(&txn).await?;
    if reviews > 0 {
        return Err(ServiceError::invalid_state("cannot delete a reviewed booking"));
    }
    let request_id = request_id_of(&txn, found.quote_id).await?;
    booking::Entity::delete_by_id(id).exec(&txn).await?;
    move_request(&txn, request_id, RequestEvent::BookingRemoved).await?;
    txn.commit().await?;
    info!(event = "booking_deleted", booking_id = %id, "booking deleted");
    Ok(())
}
