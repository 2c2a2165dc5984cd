//! FILENAME: app/server/src/error.rs
// PURPOSE: The single boundary where errors become HTTP responses.
// CONTEXT: Every failure is answered with {success: false, error, message}.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use engine::StoreError;
use group_engine::GroupingError;
use persistence::PersistenceError;
use serde::Serialize;
use thiserror::Error;

use crate::{log_error, log_warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or query string could not be extracted.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Query(#[from] GroupingError),

    #[error(transparent)]
    Upload(PersistenceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(PersistenceError),
}

/// Failure envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected { status, .. } => *status,
            ApiError::Validation(_) | ApiError::Query(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload(PersistenceError::UnsupportedFormat(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Upload(PersistenceError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short summary for the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            ApiError::Rejected { .. } | ApiError::Validation(_) => "Invalid request",
            ApiError::Query(_) => "Error performing analysis",
            ApiError::Upload(_) => "Error processing file",
            ApiError::Store(_) => "Error accessing stored rows",
            ApiError::Export(_) => "Error exporting analysis",
        }
    }

    pub fn lock_poisoned() -> Self {
        ApiError::Store(StoreError::Unavailable("row store lock poisoned".to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        // Missing or malformed query parameters are validation failures.
        ApiError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError::Rejected {
            status: error.status(),
            message: error.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: self.label().to_string(),
            message: self.to_string(),
        };

        if status.is_server_error() {
            log_error!("API", "{} {}: {}", status.as_u16(), body.error, body.message);
        } else {
            log_warn!("API", "{} {}: {}", status.as_u16(), body.error, body.message);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Query(GroupingError::EmptyGroupBy).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Upload(PersistenceError::EmptyUpload).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Upload(PersistenceError::UnsupportedFormat("a.txt".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::lock_poisoned().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::Export(PersistenceError::OutOfBounds { row: 0, col: 70_000 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_carries_source() {
        let err = ApiError::Upload(PersistenceError::RowShape { row: 4, expected: 3, found: 2 });
        assert_eq!(err.to_string(), "Row 4 has 2 cells but the header has 3");
        assert_eq!(err.label(), "Error processing file");
    }
}
