use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::errors::ServiceError;

/// JSON error body: `{"error": <title>, "message": <detail>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &str, detail: Option<String>) -> Self {
        Self { status, title: title.to_string(), detail }
    }

    pub fn unauthorized(detail: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.to_string()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let message = self.detail.unwrap_or_else(|| self.title.clone());
        (self.status, Json(serde_json::json!({"error": self.title, "message": message}))).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(m)),
            ServiceError::InvalidState(m) => Self::new(StatusCode::BAD_REQUEST, "Invalid State", Some(m)),
            ServiceError::Unauthorized(m) => Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(m)),
            ServiceError::Forbidden(m) => Self::new(StatusCode::FORBIDDEN, "Forbidden", Some(m)),
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(m)),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, "Conflict", Some(m)),
            ServiceError::Db(m) => {
                error!(err = %m, "request failed with database error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some("something went wrong".into()))
            }
        }
    }
}

impl From<service::auth::errors::AuthError> for JsonApiError {
    fn from(e: service::auth::errors::AuthError) -> Self { ServiceError::from(e).into() }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
