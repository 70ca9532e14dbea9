use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use service::policy::Caller;
use service::quote_service::{self, CreateQuote, QuoteSummary, UpdateQuote};

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(get, path = "/api/quotes", tag = "quotes", responses((status = 200, description = "Quotes visible to the caller")))]
pub async fn list(State(state): State<ServerState>, Extension(caller): Extension<Caller>) -> Result<Json<Vec<QuoteSummary>>, JsonApiError> {
    Ok(Json(quote_service::list(&state.db, &caller).await?))
}

#[utoipa::path(post, path = "/api/quotes", tag = "quotes", request_body = crate::openapi::CreateQuoteRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error or request not open or already quoted"), (status = 403, description = "Mechanics only")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateQuote>,
) -> Result<(StatusCode, Json<models::quote::Model>), JsonApiError> {
    let created = quote_service::create(&state.db, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/quotes/{id}", tag = "quotes", params(("id" = Uuid, Path, description = "Quote ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuoteSummary>, JsonApiError> {
    Ok(Json(quote_service::get(&state.db, &caller, id).await?))
}

#[utoipa::path(put, path = "/api/quotes/{id}", tag = "quotes", params(("id" = Uuid, Path, description = "Quote ID")), request_body = crate::openapi::UpdateQuoteRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error or quote already decided"), (status = 403, description = "Forbidden")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateQuote>,
) -> Result<Json<models::quote::Model>, JsonApiError> {
    Ok(Json(quote_service::update(&state.db, &caller, id, input).await?))
}

#[utoipa::path(delete, path = "/api/quotes/{id}", tag = "quotes", params(("id" = Uuid, Path, description = "Quote ID")), responses((status = 204, description = "Deleted"), (status = 400, description = "Quote decided or booked")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    quote_service::delete(&state.db, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
