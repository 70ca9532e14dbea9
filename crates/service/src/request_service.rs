//! Service requests: the client's side of the lifecycle.
//!
//! Clients own requests and edit their descriptive fields. A mechanic who has quoted on an
//! open request may cancel it. Once the request is booked only the booked mechanic may, and
//! the live booking is cancelled with it. No other status change goes through this module.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::lifecycle::{BookingStatus, RequestEvent, RequestStatus};
use models::{booking, mechanic, quote, service_request, vehicle};

use crate::errors::ServiceError;
use crate::mechanic_service::profile_of;
use crate::policy::{authorize, Action, Caller, Ownership};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRequest {
    pub vehicle_id: Option<Uuid>,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub preferred_date: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    pub service_type: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub urgency: Option<String>,
    pub preferred_date: Option<String>,
    pub photo: Option<String>,
    pub status: Option<String>,
}

impl UpdateRequest {
    fn has_details(&self) -> bool {
        self.service_type.is_some()
            || self.description.is_some()
            || self.location.is_some()
            || self.urgency.is_some()
            || self.preferred_date.is_some()
            || self.photo.is_some()
    }
}

/// A request as listed: clients get `quote_count`, mechanics get `has_quoted`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    #[serde(flatten)]
    pub request: service_request::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_quoted: Option<bool>,
}

pub async fn list(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<RequestSummary>, ServiceError> {
    if caller.is_client() {
        let rows = service_request::Entity::find()
            .filter(service_request::Column::UserId.eq(caller.user_id))
            .order_by_desc(service_request::Column::CreatedAt)
            .all(db)
            .await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let quoted: Vec<Uuid> = quote::Entity::find()
            .select_only()
            .column(quote::Column::RequestId)
            .filter(quote::Column::RequestId.is_in(ids))
            .into_tuple()
            .all(db)
            .await?;
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for id in quoted {
            *counts.entry(id).or_default() += 1;
        }
        Ok(rows
            .into_iter()
            .map(|r| {
                let n = counts.get(&r.id).copied().unwrap_or(0);
                RequestSummary { request: r, quote_count: Some(n), has_quoted: None }
            })
            .collect())
    } else {
        let me = profile_of(db, caller).await?;
        let rows = service_request::Entity::find()
            .filter(service_request::Column::Status.eq(RequestStatus::Open))
            .order_by_desc(service_request::Column::CreatedAt)
            .all(db)
            .await?;
        let mine: HashSet<Uuid> = quote::Entity::find()
            .select_only()
            .column(quote::Column::RequestId)
            .filter(quote::Column::MechanicId.eq(me.id))
            .into_tuple::<Uuid>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        Ok(rows
            .into_iter()
            .map(|r| {
                let quoted = mine.contains(&r.id);
                RequestSummary { request: r, quote_count: None, has_quoted: Some(quoted) }
            })
            .collect())
    }
}

/// Clients see only their own requests; mechanics see any.
pub async fn get(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<service_request::Model, ServiceError> {
    service_request::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|r| caller.is_mechanic() || r.user_id == caller.user_id)
        .ok_or_else(|| ServiceError::not_found("service request"))
}

#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn create(db: &DatabaseConnection, caller: &Caller, input: CreateRequest) -> Result<service_request::Model, ServiceError> {
    authorize(caller, Action::CreateRequest, &Ownership::none())?;
    let vehicle_id = input.vehicle_id.ok_or_else(|| ServiceError::Validation("vehicle_id required".into()))?;
    vehicle::Entity::find_by_id(vehicle_id)
        .one(db)
        .await?
        .filter(|v| v.user_id == caller.user_id)
        .ok_or_else(|| ServiceError::not_found("vehicle"))?;

    let created = service_request::create(
        db,
        caller.user_id,
        service_request::NewRequest {
            vehicle_id,
            service_type: &input.service_type,
            description: &input.description,
            location: &input.location,
            urgency: &input.urgency,
            preferred_date: &input.preferred_date,
            photo: input.photo.as_deref(),
        },
    )
    .await?;
    info!(event = "request_created", request_id = %created.id, status = created.status.as_str(), "service request created");
    Ok(created)
}

#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn update(
    db: &DatabaseConnection,
    caller: &Caller,
    id: Uuid,
    input: UpdateRequest,
) -> Result<service_request::Model, ServiceError> {
    if !input.has_details() && input.status.is_none() {
        return Err(ServiceError::Validation("no updates provided".into()));
    }
    let txn = db.begin().await?;
    let found = service_request::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;

    let updated = if caller.is_mechanic() {
        if input.has_details() {
            return Err(ServiceError::forbidden("mechanics may only change a request's status"));
        }
        let target = match input.status.as_deref() {
            Some(s) => RequestStatus::parse(s)?,
            None => return Err(ServiceError::Validation("status required".into())),
        };
        if target != RequestStatus::Cancelled {
            return Err(ServiceError::forbidden("mechanics may only cancel a request"));
        }
        let me = profile_of(&txn, caller).await?;
        let quoted = quote::Entity::find()
            .filter(quote::Column::RequestId.eq(id))
            .filter(quote::Column::MechanicId.eq(me.id))
            .count(&txn)
            .await?
            > 0;
        let ownership = if quoted { Ownership::both(found.user_id, caller.user_id) } else { Ownership::client(found.user_id) };
        authorize(caller, Action::CancelRequest, &ownership)?;
        if found.status == RequestStatus::InProgress {
            cancel_live_booking(&txn, &me, id).await?;
        }

        let from = found.status;
        let next = from.apply(RequestEvent::Cancelled)?;
        let mut am: service_request::ActiveModel = found.into();
        am.status = Set(next);
        am.updated_at = Set(Utc::now().into());
        let saved = am.update(&txn).await?;
        info!(event = "request_status_changed", request_id = %id, from = from.as_str(), to = next.as_str(), "service request cancelled");
        saved
    } else {
        authorize(caller, Action::EditRequest, &Ownership::client(found.user_id))?;
        if input.status.is_some() {
            return Err(ServiceError::forbidden("clients cannot change a request's status"));
        }
        let mut am: service_request::ActiveModel = found.into();
        if let Some(v) = input.service_type {
            vehicle::validate_required("service_type", &v)?;
            am.service_type = Set(v.trim().to_string());
        }
        if let Some(v) = input.description {
            vehicle::validate_required("description", &v)?;
            am.description = Set(v.trim().to_string());
        }
        if let Some(v) = input.location {
            vehicle::validate_required("location", &v)?;
            am.location = Set(v.trim().to_string());
        }
        if let Some(v) = input.urgency {
            service_request::validate_urgency(&v)?;
            am.urgency = Set(v);
        }
        if let Some(v) = input.preferred_date {
            vehicle::validate_required("preferred_date", &v)?;
            am.preferred_date = Set(v.trim().to_string());
        }
        if let Some(v) = input.photo {
            am.photo = Set(Some(v));
        }
        am.updated_at = Set(Utc::now().into());
        let saved = am.update(&txn).await?;
        info!(event = "request_updated", request_id = %id, "service request updated");
        saved
    };
    txn.commit().await?;
    Ok(updated)
}

/// Cancel the booking holding an in-progress request. Only its mechanic may do so.
async fn cancel_live_booking<C: ConnectionTrait>(db: &C, me: &mechanic::Model, request_id: Uuid) -> Result<(), ServiceError> {
    let live = booking::Entity::find()
        .join(JoinType::InnerJoin, booking::Relation::Quote.def())
        .filter(quote::Column::RequestId.eq(request_id))
        .filter(booking::Column::Status.is_in([BookingStatus::Scheduled, BookingStatus::InProgress]))
        .one(db)
        .await?;
    let Some(live) = live else { return Ok(()) };
    if live.mechanic_id != me.id {
        return Err(ServiceError::forbidden("only the booked mechanic may cancel a request in progress"));
    }
    let to = live.status.advance(BookingStatus::Cancelled)?;
    let booking_id = live.id;
    let mut am: booking::ActiveModel = live.into();
    am.status = Set(to);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    info!(event = "booking_status_changed", booking_id = %booking_id, to = to.as_str(), "booking cancelled with its request");
    Ok(())
}

/// Delete a request that has not been quoted.
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = service_request::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;
    authorize(caller, Action::DeleteRequest, &Ownership::client(found.user_id))?;
    let quotes = quote::Entity::find().filter(quote::Column::RequestId.eq(id)).count(&txn).await?;
    if quotes > 0 {
        return Err(ServiceError::invalid_state("cannot delete a service request that has quotes"));
    }
    service_request::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(event = "request_deleted", request_id = %id, "service request deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, get_db, mechanic};
    use crate::{quote_service, vehicle_service};

    pub(crate) fn brakes(vehicle_id: Uuid) -> CreateRequest {
        CreateRequest {
            vehicle_id: Some(vehicle_id),
            service_type: "brakes".into(),
            description: "grinding noise".into(),
            location: "Springfield".into(),
            urgency: "high".into(),
            preferred_date: "2026-11-01".into(),
            photo: None,
        }
    }

    async fn vehicle_for(db: &DatabaseConnection, c: &Caller) -> Result<Uuid, anyhow::Error> {
        let v = vehicle_service::create(
            db,
            c,
            vehicle_service::CreateVehicle {
                make: "Honda".into(),
                model: "Civic".into(),
                year: Some(2015),
                license_plate: "ABC123".into(),
                vin: "1HGCM82633A004352".into(),
            },
        )
        .await?;
        Ok(v.id)
    }

    fn quote_on(request_id: Uuid) -> quote_service::CreateQuote {
        quote_service::CreateQuote {
            request_id: Some(request_id),
            cost: Some(100.0),
            time_required: "2h".into(),
            parts_needed: None,
            availability: "tomorrow".into(),
        }
    }

    #[tokio::test]
    async fn create_requires_owned_vehicle() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let owner = client(&db, "o@example.com").await?;
        let other = client(&db, "x@example.com").await?;
        let vid = vehicle_for(&db, &owner).await?;

        let r = create(&db, &owner, brakes(vid)).await?;
        assert_eq!(r.status, RequestStatus::Open);
        assert!(matches!(create(&db, &other, brakes(vid)).await, Err(ServiceError::NotFound(_))));

        let mut bad = brakes(vid);
        bad.urgency = "someday".into();
        assert!(matches!(create(&db, &owner, bad).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn listing_differs_by_role() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let vid = vehicle_for(&db, &c).await?;
        let r = create(&db, &c, brakes(vid)).await?;

        let mine = list(&db, &c).await?;
        assert_eq!(mine[0].quote_count, Some(0));
        assert_eq!(list(&db, &m).await?[0].has_quoted, Some(false));

        quote_service::create(&db, &m, quote_on(r.id)).await?;
        assert_eq!(list(&db, &c).await?[0].quote_count, Some(1));
        assert_eq!(list(&db, &m).await?[0].has_quoted, Some(true));

        assert!(get(&db, &m, r.id).await.is_ok());
        let other = client(&db, "o@example.com").await?;
        assert!(matches!(get(&db, &other, r.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn client_edits_details_but_not_status() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let vid = vehicle_for(&db, &c).await?;
        let r = create(&db, &c, brakes(vid)).await?;

        let edited = update(&db, &c, r.id, UpdateRequest { description: Some("louder now".into()), ..Default::default() }).await?;
        assert_eq!(edited.description, "louder now");

        let err = update(&db, &c, r.id, UpdateRequest { status: Some("completed".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = update(&db, &c, r.id, UpdateRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let stranger = client(&db, "s@example.com").await?;
        let err = update(&db, &stranger, r.id, UpdateRequest { location: Some("x".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        Ok(())
    }

    #[tokio::test]
    async fn only_a_quoting_mechanic_may_cancel() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (quoting, _) = mechanic(&db, "q@example.com").await?;
        let (bystander, _) = mechanic(&db, "b@example.com").await?;
        let vid = vehicle_for(&db, &c).await?;
        let r = create(&db, &c, brakes(vid)).await?;
        quote_service::create(&db, &quoting, quote_on(r.id)).await?;

        let cancel = || UpdateRequest { status: Some("cancelled".into()), ..Default::default() };
        assert!(matches!(update(&db, &bystander, r.id, cancel()).await, Err(ServiceError::Forbidden(_))));
        let err = update(&db, &quoting, r.id, UpdateRequest { status: Some("completed".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = update(&db, &quoting, r.id, UpdateRequest { status: Some("finished".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let cancelled = update(&db, &quoting, r.id, cancel()).await?;
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        let err = update(&db, &quoting, r.id, cancel()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        Ok(())
    }

    #[tokio::test]
    async fn cancelling_a_booked_request_needs_the_booked_mechanic() -> Result<(), anyhow::Error> {
        use crate::booking_service::{self, tests::{accepted_quote, book, status}};

        let db = get_db().await?;
        let ch = accepted_quote(&db).await?;
        let (earlier, _) = mechanic(&db, "earlier@example.com").await?;
        quote_service::create(&db, &earlier, quote_on(ch.request_id)).await?;
        let b = booking_service::create(&db, &ch.client, book(ch.quote_id)).await?;

        let cancel = || UpdateRequest { status: Some("cancelled".into()), ..Default::default() };
        let err = update(&db, &earlier, ch.request_id, cancel()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert_eq!(get(&db, &ch.client, ch.request_id).await?.status, RequestStatus::InProgress);

        // the booking is still resolvable after the refused cancel
        booking_service::update(&db, &ch.mechanic, b.id, status("in_progress")).await?;

        let cancelled = update(&db, &ch.mechanic, ch.request_id, cancel()).await?;
        assert_eq!(cancelled.status, RequestStatus::Cancelled);
        let live = booking::Entity::find_by_id(b.id).one(&db).await?.expect("booking");
        assert_eq!(live.status, BookingStatus::Cancelled);
        let err = booking_service::update(&db, &ch.mechanic, b.id, status("completed")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        Ok(())
    }

    #[tokio::test]
    async fn delete_guards() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let vid = vehicle_for(&db, &c).await?;
        let quoted = create(&db, &c, brakes(vid)).await?;
        let lonely = create(&db, &c, brakes(vid)).await?;
        quote_service::create(&db, &m, quote_on(quoted.id)).await?;

        assert!(matches!(delete(&db, &c, quoted.id).await, Err(ServiceError::InvalidState(_))));
        let err = vehicle_service::delete(&db, &c, vid).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        delete(&db, &c, lonely.id).await?;
        assert!(matches!(get(&db, &c, lonely.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
