use sea_orm::{entity::prelude::*, ConnectionTrait, QuerySelect, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{booking, errors, mechanic, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub mechanic_id: Uuid,
    pub rating: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Booking,
    Mechanic,
    Reviewer,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Booking => Entity::belongs_to(booking::Entity)
                .from(Column::BookingId)
                .to(booking::Column::Id)
                .into(),
            Relation::Mechanic => Entity::belongs_to(mechanic::Entity)
                .from(Column::MechanicId)
                .to(mechanic::Column::Id)
                .into(),
            Relation::Reviewer => Entity::belongs_to(user::Entity)
                .from(Column::ReviewerId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<booking::Entity> for Entity {
    fn to() -> RelationDef { Relation::Booking.def() }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Reviewer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_rating(rating: i32) -> Result<(), errors::ModelError> {
    if !(1..=5).contains(&rating) {
        return Err(errors::ModelError::Validation("rating must be between 1 and 5".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    booking: &booking::Model,
    rating: i32,
    comment: Option<&str>,
) -> Result<Model, errors::ModelError> {
    validate_rating(rating)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        reviewer_id: Set(booking.client_id),
        mechanic_id: Set(booking.mechanic_id),
        rating: Set(rating),
        comment: Set(comment.map(str::to_string)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Ratings of every review a mechanic has received.
pub async fn ratings_for<C: ConnectionTrait>(db: &C, mechanic_id: Uuid) -> Result<Vec<i32>, errors::ModelError> {
    Ok(Entity::find()
        .select_only()
        .column(Column::Rating)
        .filter(Column::MechanicId.eq(mechanic_id))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: usize,
    pub five_star: usize,
    pub four_star: usize,
    pub three_star: usize,
    pub two_star: usize,
    pub one_star: usize,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let mut s = RatingSummary { count: ratings.len(), ..Default::default() };
        for r in ratings {
            match r {
                5 => s.five_star += 1,
                4 => s.four_star += 1,
                3 => s.three_star += 1,
                2 => s.two_star += 1,
                1 => s.one_star += 1,
                _ => {}
            }
        }
        if !ratings.is_empty() {
            let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
            s.average = Some(sum as f64 / ratings.len() as f64);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn summary_counts_and_averages() {
        let s = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(s.count, 3);
        assert_eq!(s.four_star, 2);
        assert!((s.average.unwrap() - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(RatingSummary::from_ratings(&[]).average, None);
    }
}
