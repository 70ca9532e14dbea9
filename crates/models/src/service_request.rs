use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, lifecycle::RequestStatus, user, vehicle};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The requesting client.
    pub user_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_type: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    pub urgency: String,
    pub preferred_date: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub photo: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Vehicle,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Vehicle => Entity::belongs_to(vehicle::Entity).from(Column::VehicleId).to(vehicle::Column::Id).into(),
        }
    }
}

impl Related<vehicle::Entity> for Entity {
    fn to() -> RelationDef { Relation::Vehicle.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub const URGENCY_LEVELS: [&str; 4] = ["low", "medium", "high", "emergency"];

pub fn validate_urgency(urgency: &str) -> Result<(), errors::ModelError> {
    if !URGENCY_LEVELS.contains(&urgency) {
        return Err(errors::ModelError::Validation(format!(
            "urgency must be one of {}",
            URGENCY_LEVELS.join(", ")
        )));
    }
    Ok(())
}

pub struct NewRequest<'a> {
    pub vehicle_id: Uuid,
    pub service_type: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub urgency: &'a str,
    pub preferred_date: &'a str,
    pub photo: Option<&'a str>,
}

pub async fn create<C: ConnectionTrait>(db: &C, user_id: Uuid, r: NewRequest<'_>) -> Result<Model, errors::ModelError> {
    vehicle::validate_required("service_type", r.service_type)?;
    vehicle::validate_required("description", r.description)?;
    vehicle::validate_required("location", r.location)?;
    vehicle::validate_required("preferred_date", r.preferred_date)?;
    validate_urgency(r.urgency)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        vehicle_id: Set(r.vehicle_id),
        service_type: Set(r.service_type.trim().to_string()),
        description: Set(r.description.trim().to_string()),
        location: Set(r.location.trim().to_string()),
        urgency: Set(r.urgency.to_string()),
        preferred_date: Set(r.preferred_date.trim().to_string()),
        photo: Set(r.photo.map(str::to_string)),
        status: Set(RequestStatus::Open),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
