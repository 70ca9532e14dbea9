use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use service::booking_service::{self, BookingSummary, CreateBooking, UpdateBooking};
use service::policy::Caller;

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(get, path = "/api/bookings", tag = "bookings", responses((status = 200, description = "Bookings visible to the caller")))]
pub async fn list(State(state): State<ServerState>, Extension(caller): Extension<Caller>) -> Result<Json<Vec<BookingSummary>>, JsonApiError> {
    Ok(Json(booking_service::list(&state.db, &caller).await?))
}

#[utoipa::path(post, path = "/api/bookings", tag = "bookings", request_body = crate::openapi::CreateBookingRequest, responses((status = 201, description = "Created; the request moves to in_progress"), (status = 400, description = "Quote not accepted, request not open or quote already booked"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateBooking>,
) -> Result<(StatusCode, Json<models::booking::Model>), JsonApiError> {
    let created = booking_service::create(&state.db, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingSummary>, JsonApiError> {
    Ok(Json(booking_service::get(&state.db, &caller, id).await?))
}

#[utoipa::path(put, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking ID")), request_body = crate::openapi::UpdateBookingRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error or invalid transition"), (status = 403, description = "Forbidden")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBooking>,
) -> Result<Json<models::booking::Model>, JsonApiError> {
    Ok(Json(booking_service::update(&state.db, &caller, id, input).await?))
}

#[utoipa::path(delete, path = "/api/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking ID")), responses((status = 204, description = "Deleted; the request reopens"), (status = 400, description = "Booking not scheduled or already reviewed")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    booking_service::delete(&state.db, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
