use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, lifecycle::BookingStatus, quote};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quote_id: Uuid,
    /// Copied from the quote's request at creation and never changed.
    pub client_id: Uuid,
    pub mechanic_id: Uuid,
    pub scheduled_date: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Quote }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Quote => Entity::belongs_to(quote::Entity)
                .from(Column::QuoteId)
                .to(quote::Column::Id)
                .into(),
        }
    }
}

impl Related<quote::Entity> for Entity {
    fn to() -> RelationDef { Relation::Quote.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewBooking<'a> {
    pub quote_id: Uuid,
    pub client_id: Uuid,
    pub mechanic_id: Uuid,
    pub scheduled_date: &'a str,
    pub notes: Option<&'a str>,
}

pub async fn create<C: ConnectionTrait>(db: &C, b: NewBooking<'_>) -> Result<Model, errors::ModelError> {
    crate::vehicle::validate_required("scheduled_date", b.scheduled_date)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        quote_id: Set(b.quote_id),
        client_id: Set(b.client_id),
        mechanic_id: Set(b.mechanic_id),
        scheduled_date: Set(b.scheduled_date.trim().to_string()),
        notes: Set(b.notes.map(str::to_string)),
        status: Set(BookingStatus::Scheduled),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
