use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::schemas::{FieldError, ValidationErrors};

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures a request handler can end in.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range input, rejected before touching the store.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Review {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<FieldError> for ApiError {
    fn from(error: FieldError) -> Self {
        ApiError::Validation(error.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!({ "detail": errors.0 }),
            ApiError::NotFound(_) => json!({ "detail": self.to_string() }),
            ApiError::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                json!({ "detail": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
