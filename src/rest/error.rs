use thiserror::Error;

use crate::datastore::DatastoreError;
use crate::http::response::StatusCode;

/// A value the JSON renderer cannot encode.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("field {field:?} cannot be encoded: {reason}")]
    UnencodableValue { field: String, reason: String },
}

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("resource not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl RestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::NotFound => StatusCode::NotFound,
            RestError::MethodNotAllowed => StatusCode::MethodNotAllowed,
            RestError::InvalidQuery(_) => StatusCode::BadRequest,
            RestError::Datastore(DatastoreError::Timeout(_)) => StatusCode::GatewayTimeout,
            RestError::Datastore(_) => StatusCode::InternalServerError,
            RestError::Render(_) => StatusCode::InternalServerError,
        }
    }
}
