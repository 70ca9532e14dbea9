use std::sync::Arc;

use axum::{Extension, Json, extract::{State, Request}, http::{header, StatusCode}, middleware::Next, response::Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use sea_orm::DatabaseConnection;

use common::types::Message;
use service::auth::domain::{AuthUser, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::AuthService;
use service::mechanic_service;
use service::policy::Caller;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, auth_cfg: service::auth::AuthConfig) -> Self {
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        Self { db, auth: Arc::new(AuthService::new(repo, auth_cfg)) }
    }
}

#[derive(Serialize)]
pub struct AuthOutput { pub token: String, pub user: AuthUser }

#[derive(Serialize)]
pub struct ProfileOutput {
    pub user: AuthUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanic: Option<models::mechanic::Model>,
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<(StatusCode, Json<AuthOutput>), JsonApiError> {
    let session = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(AuthOutput { token: session.token, user: session.user })))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<AuthOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(AuthOutput { token: session.token, user: session.user })))
}

#[utoipa::path(get, path = "/api/auth/profile", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn profile(State(state): State<ServerState>, Extension(caller): Extension<Caller>) -> Result<Json<ProfileOutput>, JsonApiError> {
    let user = state.auth.profile(caller.user_id).await?;
    let mechanic = if caller.is_mechanic() {
        mechanic_service::find_by_user(&state.db, caller.user_id).await?
    } else {
        None
    };
    Ok(Json(ProfileOutput { user, mechanic }))
}

#[utoipa::path(put, path = "/api/auth/profile", tag = "auth", request_body = crate::openapi::UpdateProfileRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request")))]
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<AuthUser>, JsonApiError> {
    Ok(Json(state.auth.update_profile(caller.user_id, input).await?))
}

#[utoipa::path(put, path = "/api/auth/change-password", tag = "auth", request_body = crate::openapi::ChangePasswordRequest, responses((status = 200, description = "Password changed"), (status = 401, description = "Wrong current password")))]
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ChangePasswordInput>,
) -> Result<Json<Message>, JsonApiError> {
    state.auth.change_password(caller.user_id, input).await?;
    Ok(Json(Message::new("password updated")))
}

/// Bearer token from the Authorization header, falling back to the `auth_token` cookie.
fn bearer_token(req: &Request) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let h = h.to_str().map_err(|_| JsonApiError::unauthorized("malformed Authorization header"))?;
        return match h.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            _ => Err(JsonApiError::unauthorized("expected Authorization: Bearer <token>")),
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Route layer for protected routes: verifies the token and stores the `Caller` in request
/// extensions. A missing, invalid or expired token is 401.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = bearer_token(&req)? else {
        tracing::warn!(path = %path, "missing Authorization header and auth_token cookie");
        return Err(JsonApiError::unauthorized("authentication required"));
    };
    let claims = state.auth.verify_token(&token).map_err(|e| {
        tracing::warn!(path = %path, err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid or expired token")
    })?;
    let user_id = claims.user_id().ok_or_else(|| JsonApiError::unauthorized("invalid or expired token"))?;
    req.extensions_mut().insert(Caller::new(user_id, claims.role));
    Ok(next.run(req).await)
}
