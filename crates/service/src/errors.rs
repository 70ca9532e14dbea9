use thiserror::Error;

use models::errors::ModelError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }

    pub fn invalid_state(msg: impl Into<String>) -> Self { Self::InvalidState(msg.into()) }

    /// A unique index standing behind a lifecycle rule reports a broken guard, not a clash
    /// of user-supplied values.
    pub fn conflict_as_invalid_state(self, msg: &str) -> Self {
        match self {
            Self::Conflict(_) => Self::InvalidState(msg.to_string()),
            other => other,
        }
    }

    /// Replace the store's raw unique-violation text with a message fit for clients.
    pub fn with_conflict_message(self, msg: &str) -> Self {
        match self {
            Self::Conflict(_) => Self::Conflict(msg.to_string()),
            other => other,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => Self::Validation(m),
            ModelError::InvalidTransition(m) => Self::InvalidState(m),
            ModelError::Conflict(m) => Self::Conflict(m),
            ModelError::Db(m) => Self::Db(m),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { ModelError::from(e).into() }
}

impl From<crate::auth::errors::AuthError> for ServiceError {
    fn from(e: crate::auth::errors::AuthError) -> Self {
        use crate::auth::errors::AuthError;
        match e {
            AuthError::Validation(m) => Self::Validation(m),
            AuthError::Conflict => Self::Conflict("email already registered".into()),
            AuthError::NotFound => Self::not_found("user"),
            AuthError::Unauthorized => Self::Unauthorized("invalid credentials".into()),
            AuthError::InvalidToken(m) => Self::Unauthorized(m),
            AuthError::HashError(m) | AuthError::TokenError(m) | AuthError::Repository(m) => Self::Db(m),
        }
    }
}
