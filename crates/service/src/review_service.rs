use uuid::Uuid;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use common::pagination::{PageInfo, Pagination};
use models::lifecycle::BookingStatus;
use models::review::RatingSummary;
use models::{booking, mechanic, review, user};

use crate::errors::ServiceError;
use crate::policy::{authorize, Action, Caller, Ownership};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReview {
    pub booking_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: review::Model,
    pub reviewer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    pub average_rating: Option<f64>,
    pub five_star: usize,
    pub four_star: usize,
    pub three_star: usize,
    pub two_star: usize,
    pub one_star: usize,
}

impl From<RatingSummary> for ReviewStats {
    fn from(s: RatingSummary) -> Self {
        Self {
            total_reviews: s.count,
            // one decimal for display; the mechanic row keeps the exact mean
            average_rating: s.average.map(|a| (a * 10.0).round() / 10.0),
            five_star: s.five_star,
            four_star: s.four_star,
            three_star: s.three_star,
            two_star: s.two_star,
            one_star: s.one_star,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MechanicReviews {
    pub reviews: Vec<ReviewView>,
    pub pagination: PageInfo,
    pub stats: ReviewStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<review::Model>,
    pub pagination: PageInfo,
}

/// Recompute a mechanic's average rating and review count from their reviews.
pub(crate) async fn refresh_mechanic_rating<C: ConnectionTrait>(db: &C, mechanic_id: Uuid) -> Result<mechanic::Model, ServiceError> {
    let ratings = review::ratings_for(db, mechanic_id).await?;
    let summary = RatingSummary::from_ratings(&ratings);
    let found = mechanic::Entity::find_by_id(mechanic_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("mechanic"))?;
    let mut am: mechanic::ActiveModel = found.into();
    am.rating = Set(summary.average);
    am.review_count = Set(i32::try_from(summary.count).unwrap_or(i32::MAX));
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "mechanic_rating_refreshed", mechanic_id = %mechanic_id, rating = ?summary.average, count = summary.count, "mechanic rating refreshed");
    Ok(updated)
}

async fn owned_review<C: ConnectionTrait>(db: &C, caller: &Caller, id: Uuid) -> Result<review::Model, ServiceError> {
    let found = review::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("review"))?;
    authorize(caller, Action::ManageReview, &Ownership::client(found.reviewer_id))?;
    Ok(found)
}

/// Review a completed booking; at most one review per booking.
#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn create(db: &DatabaseConnection, caller: &Caller, input: CreateReview) -> Result<review::Model, ServiceError> {
    let booking_id = input.booking_id.ok_or_else(|| ServiceError::Validation("booking_id required".into()))?;
    let rating = input.rating.ok_or_else(|| ServiceError::Validation("rating required".into()))?;
    review::validate_rating(rating)?;

    let txn = db.begin().await?;
    let b = booking::Entity::find_by_id(booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;
    authorize(caller, Action::CreateReview, &Ownership::client(b.client_id))?;
    if b.status != BookingStatus::Completed {
        return Err(ServiceError::invalid_state(format!("cannot review a booking that is {}", b.status.as_str())));
    }
    let existing = review::Entity::find().filter(review::Column::BookingId.eq(booking_id)).count(&txn).await?;
    if existing > 0 {
        return Err(ServiceError::invalid_state("this booking has already been reviewed"));
    }
    let created = review::create(&txn, &b, rating, input.comment.as_deref())
        .await
        .map_err(|e| ServiceError::from(e).conflict_as_invalid_state("this booking has already been reviewed"))?;
    refresh_mechanic_rating(&txn, b.mechanic_id).await?;
    txn.commit().await?;
    info!(event = "review_created", review_id = %created.id, booking_id = %booking_id, rating, "review created");
    Ok(created)
}

#[instrument(skip(db, input), fields(user_id = %caller.user_id))]
pub async fn update(db: &DatabaseConnection, caller: &Caller, id: Uuid, input: UpdateReview) -> Result<review::Model, ServiceError> {
    if input.rating.is_none() && input.comment.is_none() {
        return Err(ServiceError::Validation("no updates provided".into()));
    }
    let txn = db.begin().await?;
    let found = owned_review(&txn, caller, id).await?;
    let mechanic_id = found.mechanic_id;
    let mut am: review::ActiveModel = found.into();
    if let Some(rating) = input.rating {
        review::validate_rating(rating)?;
        am.rating = Set(rating);
    }
    if let Some(comment) = input.comment {
        am.comment = Set(Some(comment));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    refresh_mechanic_rating(&txn, mechanic_id).await?;
    txn.commit().await?;
    Ok(updated)
}

#[instrument(skip(db), fields(user_id = %caller.user_id))]
pub async fn delete(db: &DatabaseConnection, caller: &Caller, id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let found = owned_review(&txn, caller, id).await?;
    review::Entity::delete_by_id(id).exec(&txn).await?;
    refresh_mechanic_rating(&txn, found.mechanic_id).await?;
    txn.commit().await?;
    info!(event = "review_deleted", review_id = %id, "review deleted");
    Ok(())
}

/// Public, paginated reviews of one mechanic with rating stats.
pub async fn list_for_mechanic(
    db: &DatabaseConnection,
    mechanic_id: Uuid,
    page: Pagination,
    sort: ReviewSort,
) -> Result<MechanicReviews, ServiceError> {
    mechanic::Entity::find_by_id(mechanic_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("mechanic"))?;

    let (page_idx, per_page) = page.normalize();
    let query = review::Entity::find().filter(review::Column::MechanicId.eq(mechanic_id));
    let query = match sort {
        ReviewSort::Newest => query.order_by_desc(review::Column::CreatedAt),
        ReviewSort::Oldest => query.order_by_asc(review::Column::CreatedAt),
    };
    let paginator = query.find_also_related(user::Entity).paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;

    let stats = RatingSummary::from_ratings(&review::ratings_for(db, mechanic_id).await?);
    Ok(MechanicReviews {
        reviews: rows
            .into_iter()
            .map(|(r, u)| ReviewView { review: r, reviewer_name: u.map(|u| u.name) })
            .collect(),
        pagination: page.page_info(total),
        stats: stats.into(),
    })
}

/// The caller's own reviews, newest first.
pub async fn my_reviews(db: &DatabaseConnection, caller: &Caller, page: Pagination) -> Result<ReviewPage, ServiceError> {
    authorize(caller, Action::ListOwnReviews, &Ownership::none())?;
    let (page_idx, per_page) = page.normalize();
    let paginator = review::Entity::find()
        .filter(review::Column::ReviewerId.eq(caller.user_id))
        .order_by_desc(review::Column::CreatedAt)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let reviews = paginator.fetch_page(page_idx).await?;
    Ok(ReviewPage { reviews, pagination: page.page_info(total) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking_service::{self, tests::{accepted_quote, book, status}};
    use crate::test_support::client;
    use crate::test_support::get_db;

    async fn completed_booking(db: &DatabaseConnection) -> Result<(booking_service::tests::Chain, Uuid), anyhow::Error> {
        let ch = accepted_quote(db).await?;
        let b = booking_service::create(db, &ch.client, book(ch.quote_id)).await?;
        booking_service::update(db, &ch.mechanic, b.id, status("completed")).await?;
        Ok((ch, b.id))
    }

    fn five(booking_id: Uuid) -> CreateReview {
        CreateReview { booking_id: Some(booking_id), rating: Some(5), comment: Some("spotless work".into()) }
    }

    #[tokio::test]
    async fn review_sets_mechanic_rating() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (ch, booking_id) = completed_booking(&db).await?;

        let r = create(&db, &ch.client, five(booking_id)).await?;
        assert_eq!(r.mechanic_id, ch.mechanic_id);
        let m = mechanic::Entity::find_by_id(ch.mechanic_id).one(&db).await?.expect("mechanic");
        assert_eq!(m.rating, Some(5.0));
        assert_eq!(m.review_count, 1);

        assert!(matches!(create(&db, &ch.client, five(booking_id)).await, Err(ServiceError::InvalidState(_))));

        update(&db, &ch.client, r.id, UpdateReview { rating: Some(3), comment: None }).await?;
        let m = mechanic::Entity::find_by_id(ch.mechanic_id).one(&db).await?.expect("mechanic");
        assert_eq!(m.rating, Some(3.0));

        delete(&db, &ch.client, r.id).await?;
        let m = mechanic::Entity::find_by_id(ch.mechanic_id).one(&db).await?.expect("mechanic");
        assert_eq!(m.rating, None);
        assert_eq!(m.review_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn only_completed_bookings_by_their_client() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let ch = accepted_quote(&db).await?;
        let b = booking_service::create(&db, &ch.client, book(ch.quote_id)).await?;
        assert!(matches!(create(&db, &ch.client, five(b.id)).await, Err(ServiceError::InvalidState(_))));

        booking_service::update(&db, &ch.mechanic, b.id, status("completed")).await?;
        let stranger = client(&db, "stranger@example.com").await?;
        assert!(matches!(create(&db, &stranger, five(b.id)).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(create(&db, &ch.mechanic, five(b.id)).await, Err(ServiceError::Forbidden(_))));

        let mut zero = five(b.id);
        zero.rating = Some(0);
        assert!(matches!(create(&db, &ch.client, zero).await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn listing_with_stats_and_pages() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let (ch, booking_id) = completed_booking(&db).await?;
        create(&db, &ch.client, five(booking_id)).await?;

        let listed = list_for_mechanic(&db, ch.mechanic_id, Pagination::default(), ReviewSort::Newest).await?;
        assert_eq!(listed.reviews.len(), 1);
        assert_eq!(listed.reviews[0].reviewer_name.as_deref(), Some("Test Client"));
        assert_eq!(listed.stats.total_reviews, 1);
        assert_eq!(listed.stats.five_star, 1);
        assert_eq!(listed.stats.average_rating, Some(5.0));
        assert_eq!(listed.pagination.total, 1);

        let empty_page = list_for_mechanic(&db, ch.mechanic_id, Pagination { page: 2, per_page: 10 }, ReviewSort::Oldest).await?;
        assert!(empty_page.reviews.is_empty());
        assert_eq!(empty_page.pagination.page, 2);

        let mine = my_reviews(&db, &ch.client, Pagination::default()).await?;
        assert_eq!(mine.reviews.len(), 1);
        assert!(matches!(my_reviews(&db, &ch.mechanic, Pagination::default()).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(
            list_for_mechanic(&db, Uuid::new_v4(), Pagination::default(), ReviewSort::Newest).await,
            Err(ServiceError::NotFound(_))
        ));
        Ok(())
    }
}
