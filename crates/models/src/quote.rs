use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, lifecycle::QuoteStatus, mechanic, service_request};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub mechanic_id: Uuid,
    pub cost: f64,
    pub time_required: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub parts_needed: Option<String>,
    pub availability: String,
    pub status: QuoteStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Request,
    Mechanic,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Request => Entity::belongs_to(service_request::Entity)
                .from(Column::RequestId)
                .to(service_request::Column::Id)
                .into(),
            Relation::Mechanic => Entity::belongs_to(mechanic::Entity)
                .from(Column::MechanicId)
                .to(mechanic::Column::Id)
                .into(),
        }
    }
}

impl Related<service_request::Entity> for Entity {
    fn to() -> RelationDef { Relation::Request.def() }
}

impl Related<mechanic::Entity> for Entity {
    fn to() -> RelationDef { Relation::Mechanic.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_cost(cost: f64) -> Result<(), errors::ModelError> {
    if !cost.is_finite() || cost <= 0.0 {
        return Err(errors::ModelError::Validation("cost must be a positive number".into()));
    }
    Ok(())
}

pub struct NewQuote<'a> {
    pub request_id: Uuid,
    pub cost: f64,
    pub time_required: &'a str,
    pub parts_needed: Option<&'a str>,
    pub availability: &'a str,
}

pub async fn create<C: ConnectionTrait>(db: &C, mechanic_id: Uuid, q: NewQuote<'_>) -> Result<Model, errors::ModelError> {
    validate_cost(q.cost)?;
    crate::vehicle::validate_required("time_required", q.time_required)?;
    crate::vehicle::validate_required("availability", q.availability)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        request_id: Set(q.request_id),
        mechanic_id: Set(mechanic_id),
        cost: Set(q.cost),
        time_required: Set(q.time_required.trim().to_string()),
        parts_needed: Set(q.parts_needed.map(str::to_string)),
        availability: Set(q.availability.trim().to_string()),
        status: Set(QuoteStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_must_be_positive() {
        assert!(validate_cost(120.5).is_ok());
        assert!(validate_cost(0.0).is_err());
        assert!(validate_cost(-3.0).is_err());
        assert!(validate_cost(f64::NAN).is_err());
    }
}
