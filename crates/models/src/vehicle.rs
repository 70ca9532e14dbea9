use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub vin: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// First model year accepted; anything earlier is almost certainly a typo.
pub const MIN_YEAR: i32 = 1886;

pub fn validate_year(year: i32) -> Result<(), errors::ModelError> {
    let max = Utc::now().year() + 1;
    if !(MIN_YEAR..=max).contains(&year) {
        return Err(errors::ModelError::Validation(format!("year must be between {MIN_YEAR} and {max}")));
    }
    Ok(())
}

/// VINs are 17 characters, alphanumeric, never I, O or Q.
pub fn normalize_vin(vin: &str) -> Result<String, errors::ModelError> {
    let vin = vin.trim().to_ascii_uppercase();
    let valid = vin.len() == 17
        && vin.chars().all(|c| c.is_ascii_alphanumeric() && !matches!(c, 'I' | 'O' | 'Q'));
    if !valid {
        return Err(errors::ModelError::Validation("vin must be 17 characters (no I, O or Q)".into()));
    }
    Ok(vin)
}

pub fn validate_required(field: &str, value: &str) -> Result<(), errors::ModelError> {
    if value.trim().is_empty() {
        return Err(errors::ModelError::Validation(format!("{field} required")));
    }
    Ok(())
}

pub struct NewVehicle<'a> {
    pub make: &'a str,
    pub model: &'a str,
    pub year: i32,
    pub license_plate: &'a str,
    pub vin: &'a str,
}

pub async fn create<C: ConnectionTrait>(db: &C, user_id: Uuid, v: NewVehicle<'_>) -> Result<Model, errors::ModelError> {
    validate_required("make", v.make)?;
    validate_required("model", v.model)?;
    validate_required("license_plate", v.license_plate)?;
    validate_year(v.year)?;
    let vin = normalize_vin(v.vin)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        make: Set(v.make.trim().to_string()),
        model: Set(v.model.trim().to_string()),
        year: Set(v.year),
        license_plate: Set(v.license_plate.trim().to_uppercase()),
        vin: Set(vin),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
