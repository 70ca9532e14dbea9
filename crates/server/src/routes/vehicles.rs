use axum::{extract::{Path, State}, http::StatusCode, Extension, Json};
use uuid::Uuid;

use service::policy::Caller;
use service::vehicle_service::{self, CreateVehicle, UpdateVehicle};

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(get, path = "/api/vehicles", tag = "vehicles", responses((status = 200, description = "The caller's vehicles"), (status = 403, description = "Clients only")))]
pub async fn list(State(state): State<ServerState>, Extension(caller): Extension<Caller>) -> Result<Json<Vec<models::vehicle::Model>>, JsonApiError> {
    Ok(Json(vehicle_service::list(&state.db, &caller).await?))
}

#[utoipa::path(post, path = "/api/vehicles", tag = "vehicles", request_body = crate::openapi::CreateVehicleRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "VIN already registered")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateVehicle>,
) -> Result<(StatusCode, Json<models::vehicle::Model>), JsonApiError> {
    let created = vehicle_service::create(&state.db, &caller, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/vehicles/{id}", tag = "vehicles", params(("id" = Uuid, Path, description = "Vehicle ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::vehicle::Model>, JsonApiError> {
    Ok(Json(vehicle_service::get(&state.db, &caller, id).await?))
}

#[utoipa::path(put, path = "/api/vehicles/{id}", tag = "vehicles", params(("id" = Uuid, Path, description = "Vehicle ID")), request_body = crate::openapi::UpdateVehicleRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateVehicle>,
) -> Result<Json<models::vehicle::Model>, JsonApiError> {
    Ok(Json(vehicle_service::update(&state.db, &caller, id, input).await?))
}

#[utoipa::path(delete, path = "/api/vehicles/{id}", tag = "vehicles", params(("id" = Uuid, Path, description = "Vehicle ID")), responses((status = 204, description = "Deleted"), (status = 400, description = "Vehicle has service requests")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    vehicle_service::delete(&state.db, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
