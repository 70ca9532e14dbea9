use std::collections::HashSet;

use uuid::Uuid;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::lifecycle::{QuoteStatus, RequestStatus};
use models::{booking, quote, service_request};

use crate::errors::ServiceError;
use crate::mechanic_service::{profile_of, user_of};
use crate::policy::{authorize, can_view, Action, Caller, Ownership};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateQuote {
    pub request_id: Option<Uuid>,
    pub cost: Option<f64>,
    #[serde(default)]
    pub time_required: String,
    pub parts_needed: Option<String>,
    #[serde(default)]
    pub availability: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuote {
    pub cost: Option<f64>,
    pub time_required: Option<String>,
    pub parts_needed: Option<String>,
    pub availability: Option<String>,
    pub status: Option<String>,
}

impl UpdateQuote {
    fn has_terms(&self) -> bool {
        self.cost.is_some() || self.time_required.is_some() || self.parts_needed.is_some() || self.availability.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteSummary {
    #[serde(flatten)]
    pub quote: quote::Model,
    pub has_booking: bool,
}

async fn booked_quotes(db: &DatabaseConnection, ids: Vec<Uuid>) -> Result<HashSet<Uuid>, ServiceError> {
    let booked: Vec<Uuid> = booking::Entity::find()
        .select_only()
        .column(booking::Column::QuoteId)
        .filter(booking::Column::QuoteId.is_in(ids))
        .into_tuple()
        .all(db)
        .await?;
    Ok(booked.into_iter().collect())
}

async fn ownership(db: &DatabaseConnection, q: &quote::Model) -> Result<Ownership, ServiceError> {
    let request = service_request::Entity::find_by_id(q.request_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;
    let mechanic_user = user_of(db, q.mechanic_id).await?;
    Ok(Ownership::both(request.user_id, mechanic_user))
}

/// Clients see quotes on their requests; mechanics see the quotes they wrote.
pub async fn list(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<QuoteSummary>, ServiceError> {
    let query = quote::Entity::find().order_by_desc(quote::Column::CreatedAt);
    let rows = if caller.is_client() {
        query
            .join(JoinType::InnerJoin, quote::Relation::Request.def())
            .filter(service_request::Column::UserId.eq(caller.user_id))
            .all(db)
            .await?
    } else {
        let me = profile_of(db, caller).await?;
        query.filter(quote::Column::MechanicId.eq(me.id)).all(db).await?
    };
    let booked = booked_quotes(db, rows.iter().map(|q| q.id).collect()).await?;
    Ok(rows
        .into_iter()
        .map(|q| {
            let has_booking = booked.contains(&q.id);
            QuoteSummary { quote: q, has_booking }
        })
        .collect())
}

pub async fn get(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<QuoteSummary, ServiceError> {
    let q = quote::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("quote"))?;
    if !can_view(caller, &ownership(db, &q).await?) {
        return Err(ServiceError::not_found("quote"));
    }
    let has_booking = booking::Entity::find().filter(booking::Column::QuoteId.eq(id)).count(db).await? > 0;
    Ok(QuoteSummary { quote: q, has_booking })
}

/// Submit a quote on an open request; one per mechanic and request.
#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn create(db: &DatabaseConnection, caller: &Caller, input: CreateQuote) -> Result<quote::Model, ServiceError> {
    authorize(caller, Action::CreateQuote, &Ownership::none())?;
    let request_id = input.request_id.ok_or_else(|| ServiceError::Validation("request_id required".into()))?;
    let cost = input.cost.ok_or_else(|| ServiceError::Validation("cost required".into()))?;

    let txn = db.begin().await?;
    let me = profile_of(&txn, caller).await?;
    let request = service_request::Entity::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;
    if request.status != RequestStatus::Open {
        return Err(ServiceError::invalid_state(format!(
            "cannot quote a request that is {}",
            request.status.as_str()
        )));
    }
    let existing = quote::Entity::find()
        .filter(quote::Column::RequestId.eq(request_id))
        .filter(quote::Column::MechanicId.eq(me.id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(ServiceError::invalid_state("you have already quoted this request"));
    }
    let created = quote::create(
        &txn,
        me.id,
        quote::NewQuote {
            request_id,
            cost,
            time_required: &input.time_required,
            parts_needed: input.parts_needed.as_deref(),
            availability: &input.availability,
        },
    )
    .await
    .map_err(|e| ServiceError::from(e).conflict_as_invalid_state("you have already quoted this request"))?;
    txn.commit().await?;
    info!(event = "quote_created", quote_id = %created.id, request_id = %request_id, mechanic_id = %me.id, "quote created");
    Ok(created)
}

/// The quoting mechanic edits terms; the requesting client accepts or rejects.
#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn update(db: &DatabaseConnection, caller: &Caller, id: Uuid, input: UpdateQuote) -> Result<quote::Model, ServiceError> {
    let target = input.status.as_deref().map(QuoteStatus::parse).transpose()?;
    if !input.has_terms() && target.is_none() {
        return Err(ServiceError::Validation("no updates provided".into()));
    }

    let txn = db.begin().await?;
    let found = quote::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("quote"))?;
    let request = service_request::Entity::find_by_id(found.request_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("service request"))?;
    let mechanic_user = user_of(&txn, found.mechanic_id).await?;
    let owners = Ownership::both(request.user_id, mechanic_user);

    let from = found.status;
    let mut am: quote::ActiveModel = found.into();
    if caller.is_mechanic() {
        if target.is_some() {
            return Err(ServiceError::forbidden("mechanics cannot change a quote's status"));
        }
        authorize(caller, Action::EditQuote, &owners)?;
        if from != QuoteStatus::Pending {
            return Err(ServiceError::invalid_state(format!("cannot edit a quote that is {}", from.as_str())));
        }
        if let Some(cost) = input.cost {
            quote::validate_cost(cost)?;
            am.cost = Set(cost);
        }
        if let Some(v) = input.time_required {
            models::vehicle::validate_required("time_required", &v)?;
            am.time_required = Set(v.trim().to_string());
        }
        if let Some(v) = input.parts_needed {
            am.parts_needed = Set(Some(v));
        }
        if let Some(v) = input.availability {
            models::vehicle::validate_required("availability", &v)?;
            am.availability = Set(v.trim().to_string());
        }
    } else {
        authorize(caller, Action::DecideQuote, &owners)?;
        if input.has_terms() {
            return Err(ServiceError::forbidden("clients may only accept or reject a quote"));
        }
        if let Some(target) = target {
            let next = from.decide(target)?;
            am.status = Set(next);
            info!(event = "quote_status_changed", quote_id = %id, from = from.as_str(), to = next.as_str(), "quote decided");
        }
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Withdraw a pending, unbooked quote.
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = quote::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("quote"))?;
    let mechanic_user = user_of(&txn, found.mechanic_id).await?;
    authorize(caller, Action::DeleteQuote, &Ownership::mechanic(mechanic_user))?;
    if found.status != QuoteStatus::Pending {
        return Err(ServiceError::invalid_state(format!("cannot delete a quote that is {}", found.status.as_str())));
    }
    let booked = booking::Entity::find().filter(booking::Column::QuoteId.eq(id)).count(&txn).await?;
    if booked > 0 {
        return Err(ServiceError::invalid_state("cannot delete a booked quote"));
    }
    quote::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(event = "quote_deleted", quote_id = %id, "quote deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, get_db, mechanic};
    use crate::{request_service, vehicle_service};

    async fn open_request(db: &DatabaseConnection, c: &Caller) -> Result<Uuid, anyhow::Error> {
        let v = vehicle_service::create(
            db,
            c,
            vehicle_service::CreateVehicle {
                make: "Toyota".into(),
                model: "Corolla".into(),
                year: Some(2018),
                license_plate: "Q1".into(),
                vin: "JTDBR32E720123456".into(),
            },
        )
        .await?;
        let r = request_service::create(
            db,
            c,
            request_service::CreateRequest {
                vehicle_id: Some(v.id),
                service_type: "tune-up".into(),
                description: "rough idle".into(),
                location: "Capital City".into(),
                urgency: "low".into(),
                preferred_date: "2026-11-10".into(),
                photo: None,
            },
        )
        .await?;
        Ok(r.id)
    }

    fn hundred(request_id: Uuid) -> CreateQuote {
        CreateQuote {
            request_id: Some(request_id),
            cost: Some(100.0),
            time_required: "2h".into(),
            parts_needed: Some("spark plugs".into()),
            availability: "weekdays".into(),
        }
    }

    #[tokio::test]
    async fn second_quote_is_invalid_state() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let rid = open_request(&db, &c).await?;

        let q = create(&db, &m, hundred(rid)).await?;
        assert_eq!(q.status, QuoteStatus::Pending);
        assert!(matches!(create(&db, &m, hundred(rid)).await, Err(ServiceError::InvalidState(_))));
        assert!(matches!(create(&db, &c, hundred(rid)).await, Err(ServiceError::Forbidden(_))));

        let mut free = hundred(rid);
        free.cost = Some(0.0);
        let (other, _) = mechanic(&db, "o@example.com").await?;
        assert!(matches!(create(&db, &other, free).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn client_decides_once_and_mechanic_cannot() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let rid = open_request(&db, &c).await?;
        let q = create(&db, &m, hundred(rid)).await?;

        let status = |s: &str| UpdateQuote { status: Some(s.into()), ..Default::default() };
        assert!(matches!(update(&db, &m, q.id, status("accepted")).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(update(&db, &c, q.id, status("maybe")).await, Err(ServiceError::Validation(_))));
        let stranger = client(&db, "s@example.com").await?;
        assert!(matches!(update(&db, &stranger, q.id, status("accepted")).await, Err(ServiceError::Forbidden(_))));

        let accepted = update(&db, &c, q.id, status("accepted")).await?;
        assert_eq!(accepted.status, QuoteStatus::Accepted);
        assert!(matches!(update(&db, &c, q.id, status("rejected")).await, Err(ServiceError::InvalidState(_))));

        let err = update(&db, &m, q.id, UpdateQuote { cost: Some(90.0), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        Ok(())
    }

    #[tokio::test]
    async fn mechanic_edits_pending_terms() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let (other, _) = mechanic(&db, "o@example.com").await?;
        let rid = open_request(&db, &c).await?;
        let q = create(&db, &m, hundred(rid)).await?;

        let cheaper = || UpdateQuote { cost: Some(80.0), ..Default::default() };
        assert!(matches!(update(&db, &other, q.id, cheaper()).await, Err(ServiceError::Forbidden(_))));
        assert_eq!(update(&db, &m, q.id, cheaper()).await?.cost, 80.0);
        assert!(matches!(update(&db, &c, q.id, cheaper()).await, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn scoped_reads_and_delete() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let (other, _) = mechanic(&db, "o@example.com").await?;
        let rid = open_request(&db, &c).await?;
        let q = create(&db, &m, hundred(rid)).await?;

        assert_eq!(list(&db, &c).await?.len(), 1);
        assert_eq!(list(&db, &m).await?.len(), 1);
        assert!(list(&db, &other).await?.is_empty());
        assert!(!get(&db, &c, q.id).await?.has_booking);
        assert!(matches!(get(&db, &other, q.id).await, Err(ServiceError::NotFound(_))));

        assert!(matches!(delete(&db, &other, q.id).await, Err(ServiceError::Forbidden(_))));
        delete(&db, &m, q.id).await?;
        assert!(matches!(get(&db, &m, q.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
