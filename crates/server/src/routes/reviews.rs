use axum::{extract::{Path, Query, State}, http::StatusCode, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::Pagination;
use service::errors::ServiceError;
use service::policy::Caller;
use service::review_service::{self, CreateReview, MechanicReviews, ReviewPage, ReviewSort, UpdateReview};

use crate::{errors::JsonApiError, routes::auth::ServerState};

/// Query string of the public review listing: `?page=1&limit=10&sort=newest`.
#[derive(Debug, Default, Deserialize)]
pub struct MechanicReviewsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

impl MechanicReviewsQuery {
    fn pagination(&self) -> Pagination {
        let d = Pagination::default();
        Pagination { page: self.page.unwrap_or(d.page), per_page: self.limit.unwrap_or(d.per_page) }
    }

    fn sort(&self) -> Result<ReviewSort, ServiceError> {
        match self.sort.as_deref().map(str::trim) {
            None | Some("") | Some("newest") => Ok(ReviewSort::Newest),
            Some("oldest") => Ok(ReviewSort::Oldest),
            Some(other) => Err(ServiceError::Validation(format!("unknown sort '{other}', expected newest or oldest"))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[utoipa::path(post, path = "/api/reviews", tag = "reviews", request_body = crate::openapi::CreateReviewRequest, responses((status = 201, description = "Created; the mechanic rating is refreshed"), (status = 400, description = "Booking not completed, already reviewed or rating out of range"), (status = 403, description = "Clients only")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateReview>,
) -> Result<(StatusCode, Json<models::review::Model>), JsonApiError> {
    let created = review_service::create(&state.db, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/reviews/my-reviews", tag = "reviews", params(("page" = Option<u32>, Query, description = "1-based page"), ("limit" = Option<u32>, Query, description = "Page size, at most 100")), responses((status = 200, description = "Reviews written by the caller"), (status = 403, description = "Clients only")))]
pub async fn my_reviews(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ReviewPage>, JsonApiError> {
    let d = Pagination::default();
    let page = Pagination { page: q.page.unwrap_or(d.page), per_page: q.limit.unwrap_or(d.per_page) };
    Ok(Json(review_service::my_reviews(&state.db, &caller, page).await?))
}

#[utoipa::path(put, path = "/api/reviews/{id}", tag = "reviews", params(("id" = Uuid, Path, description = "Review ID")), request_body = crate::openapi::UpdateReviewRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateReview>,
) -> Result<Json<models::review::Model>, JsonApiError> {
    Ok(Json(review_service::update(&state.db, &caller, id, input).await?))
}

#[utoipa::path(delete, path = "/api/reviews/{id}", tag = "reviews", params(("id" = Uuid, Path, description = "Review ID")), responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    review_service::delete(&state.db, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/reviews/mechanic/{mechanic_id}", tag = "reviews", params(("mechanic_id" = Uuid, Path, description = "Mechanic profile ID"), ("page" = Option<u32>, Query, description = "1-based page"), ("limit" = Option<u32>, Query, description = "Page size, at most 100"), ("sort" = Option<String>, Query, description = "newest or oldest")), responses((status = 200, description = "Reviews with rating statistics"), (status = 400, description = "Unknown sort"), (status = 404, description = "Not Found")))]
pub async fn for_mechanic(
    State(state): State<ServerState>,
    Path(mechanic_id): Path<Uuid>,
    Query(q): Query<MechanicReviewsQuery>,
) -> Result<Json<MechanicReviews>, JsonApiError> {
    let sort = q.sort()?;
    Ok(Json(review_service::list_for_mechanic(&state.db, mechanic_id, q.pagination(), sort).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_defaults_to_newest() {
        let q = MechanicReviewsQuery::default();
        assert_eq!(q.sort().unwrap(), ReviewSort::Newest);
        assert_eq!(q.pagination().page, 1);
    }

    #[test]
    fn unknown_sort_is_rejected() {
        let q = MechanicReviewsQuery { sort: Some("best".into()), ..Default::default() };
        assert!(matches!(q.sort(), Err(ServiceError::Validation(_))));
    }
}
