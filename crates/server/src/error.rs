//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medibridge_core::{AccessError, OperationOutcome};

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// A resource operation failed
    Access(AccessError),
    /// The request could not be parsed at all
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Access(AccessError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Access(AccessError::InvalidId) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Access(AccessError::Validation(_) | AccessError::DuplicateIdentifier) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Access(
                AccessError::StoreUnavailable(_) | AccessError::InternalInconsistency(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        AppError::Access(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let outcome = match &self {
            AppError::Access(err) => err.to_operation_outcome(),
            AppError::BadRequest(msg) => OperationOutcome::invalid(msg),
        };

        (status, Json(outcome)).into_response()
    }
}
