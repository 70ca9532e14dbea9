use axum::{extract::{Path, State}, Extension, Json};
use uuid::Uuid;

use service::mechanic_service::{self, MechanicProfile, UpdateMechanicProfile};
use service::policy::Caller;

use crate::{errors::JsonApiError, routes::auth::ServerState};

#[utoipa::path(get, path = "/api/mechanics/{id}", tag = "mechanics", params(("id" = Uuid, Path, description = "Mechanic profile ID")), responses((status = 200, description = "Mechanic profile with contact details"), (status = 401, description = "Unauthorized"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<MechanicProfile>, JsonApiError> {
    Ok(Json(mechanic_service::get(&state.db, id).await?))
}

#[utoipa::path(put, path = "/api/mechanics/profile", tag = "mechanics", request_body = crate::openapi::UpdateMechanicProfileRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 403, description = "Mechanics only")))]
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<UpdateMechanicProfile>,
) -> Result<Json<models::mechanic::Model>, JsonApiError> {
    Ok(Json(mechanic_service::update_profile(&state.db, &caller, input).await?))
}
