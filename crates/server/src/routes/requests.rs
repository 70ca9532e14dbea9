use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use service::policy::Caller;
use service::request_service::{self, CreateRequest, RequestSummary, UpdateRequest};

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(get, path = "/api/requests", tag = "requests", responses((status = 200, description = "Own requests for clients, open requests for mechanics")))]
pub async fn list(State(state): State<ServerState>, Extension(caller): Extension<Caller>) -> Result<Json<Vec<RequestSummary>>, JsonApiError> {
    Ok(Json(request_service::list(&state.db, &caller).await?))
}

#[utoipa::path(post, path = "/api/requests", tag = "requests", request_body = crate::openapi::CreateServiceRequestRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 404, description = "Vehicle not found")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateRequest>,
) -> Result<(StatusCode, Json<models::service_request::Model>), JsonApiError> {
    let created = request_service::create(&state.db, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/requests/{id}", tag = "requests", params(("id" = Uuid, Path, description = "Service request ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::service_request::Model>, JsonApiError> {
    Ok(Json(request_service::get(&state.db, &caller, id).await?))
}

#[utoipa::path(put, path = "/api/requests/{id}", tag = "requests", params(("id" = Uuid, Path, description = "Service request ID")), request_body = crate::openapi::UpdateServiceRequestRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error or invalid transition"), (status = 403, description = "Forbidden")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRequest>,
) -> Result<Json<models::service_request::Model>, JsonApiError> {
    Ok(Json(request_service::update(&state.db, &caller, id, input).await?))
}

#[utoipa::path(delete, path = "/api/requests/{id}", tag = "requests", params(("id" = Uuid, Path, description = "Service request ID")), responses((status = 204, description = "Deleted"), (status = 400, description = "Request has quotes")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    request_service::delete(&state.db, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
