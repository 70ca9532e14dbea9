use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mechanics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub certification: Option<String>,
    pub specialization: Option<String>,
    pub service_area: Option<String>,
    pub rate: Option<f64>,
    pub verified: bool,
    pub availability: Option<String>,
    /// Average review rating; `None` until the first review.
    pub rating: Option<f64>,
    pub review_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Optional profile details captured at registration or edited later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub certification: Option<String>,
    pub specialization: Option<String>,
    pub service_area: Option<String>,
    pub rate: Option<f64>,
    pub availability: Option<String>,
}

pub fn validate_rate(rate: f64) -> Result<(), errors::ModelError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(errors::ModelError::Validation("rate must be a non-negative number".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, user_id: Uuid, profile: Profile) -> Result<Model, errors::ModelError> {
    if let Some(rate) = profile.rate { validate_rate(rate)?; }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        certification: Set(profile.certification),
        specialization: Set(profile.specialization),
        service_area: Set(profile.service_area),
        rate: Set(profile.rate),
        verified: Set(false),
        availability: Set(profile.availability),
        rating: Set(None),
        review_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}
