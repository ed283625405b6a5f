use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Storage errors map onto the transport taxonomy. A uniqueness conflict
/// deliberately takes the same validation shape as the application-level
/// duplicate rejection so a lost race is indistinguishable to clients.
impl From<database::DatabaseError> for ApiError {
    fn from(err: database::DatabaseError) -> Self {
        use database::DatabaseError;
        match err {
            DatabaseError::NotFound(what) => ApiError::NotFound(what),
            DatabaseError::Conflict(message) => ApiError::ValidationError(message),
            DatabaseError::Invalid(e) => ApiError::ValidationError(e.to_string()),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<user::UserError> for ApiError {
    fn from(err: user::UserError) -> Self {
        use user::UserError;
        match err {
            UserError::NotFound(what) => ApiError::NotFound(what),
            UserError::Conflict(message) => ApiError::ValidationError(message),
            UserError::Validation(message) => ApiError::ValidationError(message),
            UserError::Token(_) => ApiError::Unauthorized,
            UserError::Database(e) => ApiError::DatabaseError(e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("resource".to_string()),
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_conflict_takes_the_validation_shape() {
        let err: ApiError =
            database::DatabaseError::Conflict("you have already left a review".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn parent_chain_failures_are_not_found() {
        let err: ApiError = database::DatabaseError::NotFound("review".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn forbidden_reveals_nothing_about_the_resource() {
        assert_eq!(
            ApiError::Forbidden.to_string(),
            "You do not have permission to perform this action"
        );
    }
}
