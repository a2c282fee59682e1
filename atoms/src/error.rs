use lambda_http::http::StatusCode;
use thiserror::Error;

/// Failures of the identity backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session expired")]
    SessionExpired,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("identity backend error: {0}")]
    Backend(String),
}

/// Failures of the artwork collection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("artwork not found: {0}")]
    NotFound(String),

    #[error("stored artwork is malformed: {0}")]
    Corrupt(String),

    #[error("document store error: {0}")]
    Backend(String),
}

/// Failures while moving bytes to or from blob storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload interrupted: {0}")]
    Interrupted(String),

    #[error("upload cancelled")]
    Cancelled,

    #[error("blob storage error: {0}")]
    Backend(String),
}

/// Failures delivering a contact message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("failed to deliver message: {0}")]
    Delivery(String),
}

/// A client-side field check that failed. Never produced by a backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionExpired
            | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl DataError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DataError::NotFound(_) => StatusCode::NOT_FOUND,
            DataError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DataError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Rejected(_) => StatusCode::BAD_REQUEST,
            UploadError::Cancelled => StatusCode::CONFLICT,
            UploadError::Interrupted(_) | UploadError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl ContactError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
