//! Error handling for the aquafarm server
//!
//! Every failure is rendered as `{"error": {"code", "message", "field"?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::FarmError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Pond, stock and sampling rules
    #[error(transparent)]
    Domain(#[from] FarmError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                AppError::validation(*field, message)
            }
            None => AppError::validation("body", "Invalid request body"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>, field: Option<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field,
        }
    }
}

/// HTTP status of a domain rule violation
pub fn domain_status(err: &FarmError) -> StatusCode {
    match err {
        FarmError::InvalidInput { .. } | FarmError::InvalidDate { .. } => StatusCode::BAD_REQUEST,
        FarmError::DuplicateActiveStock
        | FarmError::DuplicateSamplingDate(_)
        | FarmError::AlreadyClosed => StatusCode::CONFLICT,
        FarmError::StockNotActive | FarmError::DivisionUndefined => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password", None),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired", None),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token", None),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone(), None),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone(), Some(field.clone())),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone(), Some(resource.clone())),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource), None),
            ),
            AppError::Domain(err) => (
                domain_status(err),
                ErrorDetail::new(err.code(), err.to_string(), err.field().map(String::from)),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred", None),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone(), None),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred", None),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Name of the unique constraint or index a database error violated, if any
pub fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => db.constraint(),
        _ => None,
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_domain_status_mapping() {
        assert_eq!(
            domain_status(&FarmError::invalid_input("batch_size", "bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(domain_status(&FarmError::DuplicateActiveStock), StatusCode::CONFLICT);
        assert_eq!(
            domain_status(&FarmError::DuplicateSamplingDate(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(domain_status(&FarmError::AlreadyClosed), StatusCode::CONFLICT);
        assert_eq!(
            domain_status(&FarmError::StockNotActive),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_domain_error_response_status() {
        let response = AppError::from(FarmError::AlreadyClosed).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::NotFound("Fish stock".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
