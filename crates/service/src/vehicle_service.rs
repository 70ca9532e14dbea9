use uuid::Uuid;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;

use models::{service_request, vehicle};

use crate::errors::ServiceError;
use crate::policy::{authorize, Action, Caller, Ownership};

const VIN_TAKEN: &str = "a vehicle with this VIN is already registered";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateVehicle {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    pub year: Option<i32>,
    #[serde(default)]
    pub license_plate: String,
    #[serde(default)]
    pub vin: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVehicle {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

impl UpdateVehicle {
    fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none() && self.year.is_none() && self.license_plate.is_none() && self.vin.is_none()
    }
}

/// List the caller's vehicles, newest first.
pub async fn list(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<vehicle::Model>, ServiceError> {
    authorize(caller, Action::ListVehicles, &Ownership::none())?;
    let rows = vehicle::Entity::find()
        .filter(vehicle::Column::UserId.eq(caller.user_id))
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows)
}

/// Get one of the caller's vehicles; other users' vehicles are not found.
pub async fn get(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<vehicle::Model, ServiceError> {
    authorize(caller, Action::ListVehicles, &Ownership::none())?;
    vehicle::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|v| v.user_id == caller.user_id)
        .ok_or_else(|| ServiceError::not_found("vehicle"))
}

pub async fn create(db: &DatabaseConnection, caller: &Caller, input: CreateVehicle) -> Result<vehicle::Model, ServiceError> {
    authorize(caller, Action::CreateVehicle, &Ownership::none())?;
    let year = input.year.ok_or_else(|| ServiceError::Validation("year required".into()))?;
    let created = vehicle::create(
        db,
        caller.user_id,
        vehicle::NewVehicle {
            make: &input.make,
            model: &input.model,
            year,
            license_plate: &input.license_plate,
            vin: &input.vin,
        },
    )
    .await
    .map_err(|e| ServiceError::from(e).with_conflict_message(VIN_TAKEN))?;
    info!(event = "vehicle_created", vehicle_id = %created.id, user_id = %caller.user_id, "vehicle created");
    Ok(created)
}

pub async fn update(db: &DatabaseConnection, caller: &Caller, id: Uuid, input: UpdateVehicle) -> Result<vehicle::Model, ServiceError> {
    let found = vehicle::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("vehicle"))?;
    authorize(caller, Action::ManageVehicle, &Ownership::client(found.user_id))?;
    if input.is_empty() {
        return Err(ServiceError::Validation("no updates provided".into()));
    }

    let mut am: vehicle::ActiveModel = found.into();
    if let Some(make) = input.make {
        vehicle::validate_required("make", &make)?;
        am.make = Set(make.trim().to_string());
    }
    if let Some(model) = input.model {
        vehicle::validate_required("model", &model)?;
        am.model = Set(model.trim().to_string());
    }
    if let Some(year) = input.year {
        vehicle::validate_year(year)?;
        am.year = Set(year);
    }
    if let Some(plate) = input.license_plate {
        vehicle::validate_required("license_plate", &plate)?;
        am.license_plate = Set(plate.trim().to_uppercase());
    }
    if let Some(vin) = input.vin {
        am.vin = Set(vehicle::normalize_vin(&vin)?);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am
        .update(db)
        .await
        .map_err(|e| ServiceError::from(e).with_conflict_message(VIN_TAKEN))?;
    info!(event = "vehicle_updated", vehicle_id = %id, "vehicle updated");
    Ok(updated)
}

/// Delete a vehicle that no service request refers to.
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = vehicle::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("vehicle"))?;
    authorize(caller, Action::ManageVehicle, &Ownership::client(found.user_id))?;
    let requests = service_request::Entity::find()
        .filter(service_request::Column::VehicleId.eq(id))
        .count(&txn)
        .await?;
    if requests > 0 {
        return Err(ServiceError::invalid_state("cannot delete a vehicle with service requests"));
    }
    vehicle::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;
    info!(event = "vehicle_deleted", vehicle_id = %id, "vehicle deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, get_db, mechanic};

    fn civic(vin: &str) -> CreateVehicle {
        CreateVehicle {
            make: "Honda".into(),
            model: "Civic".into(),
            year: Some(2015),
            license_plate: "abc-123".into(),
            vin: vin.into(),
        }
    }

    #[tokio::test]
    async fn vehicle_crud_is_owner_scoped() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let owner = client(&db, "owner@example.com").await?;
        let other = client(&db, "other@example.com").await?;

        let v = create(&db, &owner, civic("1HGCM82633A004352")).await?;
        assert_eq!(v.license_plate, "ABC-123");
        assert_eq!(list(&db, &owner).await?.len(), 1);
        assert!(list(&db, &other).await?.is_empty());
        assert!(matches!(get(&db, &other, v.id).await, Err(ServiceError::NotFound(_))));

        let err = update(&db, &other, v.id, UpdateVehicle { make: Some("Ford".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = update(&db, &owner, v.id, UpdateVehicle::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "no updates provided"));

        let updated = update(&db, &owner, v.id, UpdateVehicle { year: Some(2016), ..Default::default() }).await?;
        assert_eq!(updated.year, 2016);

        delete(&db, &owner, v.id).await?;
        assert!(matches!(get(&db, &owner, v.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn refused_delete_keeps_vehicle_and_requests() -> Result<(), anyhow::Error> {
        use crate::request_service;

        let db = get_db().await?;
        let owner = client(&db, "owner@example.com").await?;
        let other = client(&db, "other@example.com").await?;
        let v = create(&db, &owner, civic("1HGCM82633A004352")).await?;
        let r = request_service::create(
            &db,
            &owner,
            request_service::CreateRequest {
                vehicle_id: Some(v.id),
                service_type: "oil change".into(),
                description: "due at 5000 miles".into(),
                location: "Shelbyville".into(),
                urgency: "low".into(),
                preferred_date: "2026-12-01".into(),
                photo: None,
            },
        )
        .await?;

        assert!(matches!(delete(&db, &other, v.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(delete(&db, &owner, v.id).await, Err(ServiceError::InvalidState(_))));
        assert_eq!(get(&db, &owner, v.id).await?.id, v.id);
        assert_eq!(request_service::get(&db, &owner, r.id).await?.vehicle_id, v.id);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_vin_is_a_conflict() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let a = client(&db, "a@example.com").await?;
        let b = client(&db, "b@example.com").await?;
        create(&db, &a, civic("1HGCM82633A004352")).await?;
        let err = create(&db, &b, civic("1hgcm82633a004352")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == VIN_TAKEN));

        let second = create(&db, &a, civic("2HGCM82633A004353")).await?;
        let err = update(&db, &a, second.id, UpdateVehicle { vin: Some("1HGCM82633A004352".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn mechanics_cannot_register_vehicles() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (m, _) = mechanic(&db, "m@example.com").await?;
        let err = create(&db, &m, civic("1HGCM82633A004352")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let c = client(&db, "c@example.com").await?;
        let mut no_year = civic("1HGCM82633A004352");
        no_year.year = None;
        assert!(matches!(create(&db, &c, no_year).await, Err(ServiceError::Validation(_))));
        let mut no_make = civic("1HGCM82633A004352");
        no_make.make = String::new();
        assert!(matches!(create(&db, &c, no_make).await, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
