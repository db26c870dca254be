use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::{error::TodoError, storage::StorageError};

/// Public error body: `{"error": "..."}`, never carrying internal detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub error: String }

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self { Self { status, message: message.into() } }
}

impl From<TodoError> for ApiError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::InvalidId => Self::new(StatusCode::BAD_REQUEST, "Invalid ID format"),
            TodoError::InvalidForm(reason) => {
                tracing::debug!(%reason, "rejected request body");
                Self::new(StatusCode::BAD_REQUEST, "Failed to parse form")
            }
            TodoError::NotFound => Self::new(StatusCode::NOT_FOUND, "Todo not found"),
            // Not produced by the service today: attachment deletion is best-effort.
            TodoError::Storage(StorageError::Delete { .. }) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "File delete failed"),
            TodoError::Storage(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "File upload failed"),
            TodoError::Persistence { action, .. } => Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to {action}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(ErrorBody { error: self.message })).into_response() }
}
