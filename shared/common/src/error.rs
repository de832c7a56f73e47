use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::types::{ApiResponse, FieldError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    InvalidFields(Vec<FieldError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("State conflict: {0}")]
    InvalidState(String),

    #[error("Duplicate feedback: {0}")]
    DuplicateFeedback(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// HTTP status code mapping
impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) | AppError::InvalidState(_) | AppError::DuplicateFeedback(_) => {
                StatusCode::CONFLICT
            }
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Authentication(_) => "AUTHENTICATION_ERROR",
            AppError::Authorization(_) => "AUTHORIZATION_ERROR",
            AppError::Validation(_) | AppError::InvalidFields(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidState(_) => "STATE_CONFLICT",
            AppError::DuplicateFeedback(_) => "DUPLICATE_FEEDBACK",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to hand to a client. Dependency failures are masked.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidState(msg)
            | AppError::DuplicateFeedback(msg) => msg.clone(),
            AppError::InvalidFields(_) => "Validation failed".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", field, failure.code));
                    FieldError::new(field, message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::InvalidFields(fields)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "Request failed: {:?}", self);
        } else {
            tracing::debug!(code = self.error_code(), "Request rejected: {}", self);
        }

        let mut body = ApiResponse::<()>::error(self.public_message());
        if let AppError::InvalidFields(fields) = self {
            body = body.with_errors(fields);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "name is too short"))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        rating: u8,
    }

    #[test]
    fn test_status_mapping_distinguishes_forbidden_from_missing() {
        assert_eq!(
            AppError::Authorization("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidState("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::InvalidState("x".into()).error_code(), "STATE_CONFLICT");
    }

    #[test]
    fn test_validation_errors_become_field_errors() {
        let sample = Sample {
            name: "ab".to_string(),
            rating: 9,
        };
        let err: AppError = sample.validate().unwrap_err().into();

        match err {
            AppError::InvalidFields(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "name");
                assert_eq!(fields[0].message, "name is too short");
                assert_eq!(fields[1].field, "rating");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_internal_details_are_masked() {
        let err = AppError::Internal("connection refused at 10.0.0.3".into());
        assert_eq!(err.public_message(), "Internal server error");
    }
}
