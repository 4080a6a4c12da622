//! Error types for the Past Papers services
//!
//! Errors stay typed internally so logs can tell a validation failure from a
//! store outage, but the HTTP surface only knows two outcomes:
//! - not found (404) with a singular or plural message
//! - request failure (400) carrying the underlying message verbatim

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned when a singular lookup misses
pub const PAPER_NOT_FOUND: &str = "Paper NOT found";

/// Message returned when a collection lookup comes back empty
pub const PAPERS_NOT_FOUND: &str = "Papers NOT found";

/// Error codes for machine-readable error identification in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,
    InvalidBody,

    // Resource errors (4xxx)
    PaperNotFound,
    PapersNotFound,
    RouteNotFound,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1003,
            ErrorCode::InvalidBody => 1005,

            ErrorCode::PaperNotFound => 4002,
            ErrorCode::PapersNotFound => 4006,
            ErrorCode::RouteNotFound => 4040,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::ConfigurationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more required fields are missing or empty
    #[error("Paper validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    /// A field carried a JSON value that cannot be read as text
    #[error("Cast to string failed for value \"{value}\" at path \"{field}\"")]
    InvalidFormat { field: String, value: String },

    /// The request body could not be extracted (malformed JSON, wrong content type)
    #[error("{message}")]
    InvalidBody { message: String },

    #[error("{}", PAPER_NOT_FOUND)]
    PaperNotFound {
        unit_code: String,
        year_taken: String,
    },

    #[error("{}", PAPERS_NOT_FOUND)]
    PapersNotFound { unit_code: Option<String> },

    /// No route matches the method and path
    #[error("Cannot {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("{0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::InvalidBody { .. } => ErrorCode::InvalidBody,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::PapersNotFound { .. } => ErrorCode::PapersNotFound,
            AppError::RouteNotFound { .. } => ErrorCode::RouteNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// Anything that is not a missing record collapses into 400, store
    /// failures included.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::PaperNotFound { .. }
            | AppError::PapersNotFound { .. }
            | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the error came from the store rather than the request
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::DatabaseConnection { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NOT_FOUND
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        match &self {
            AppError::PaperNotFound {
                unit_code,
                year_taken,
            } => {
                tracing::debug!(%unit_code, %year_taken, code = code.as_code(), "Paper not found");
            }
            AppError::PapersNotFound { unit_code } => {
                tracing::debug!(
                    unit_code = unit_code.as_deref().unwrap_or("*"),
                    code = code.as_code(),
                    "Papers not found"
                );
            }
            AppError::RouteNotFound { method, path } => {
                tracing::debug!(%method, %path, code = code.as_code(), "No matching route");
            }
            err if err.is_store_error() => {
                tracing::error!(
                    error = %message,
                    code = code.as_code(),
                    status = status.as_u16(),
                    "Store error"
                );
            }
            _ => {
                tracing::warn!(
                    error = %message,
                    code = code.as_code(),
                    status = status.as_u16(),
                    "Request failed"
                );
            }
        }

        (status, Json(ErrorResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_not_found_mapping() {
        let err = AppError::PaperNotFound {
            unit_code: "CS101".into(),
            year_taken: "2023".into(),
        };
        assert_eq!(err.code(), ErrorCode::PaperNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Paper NOT found");

        let err = AppError::PapersNotFound { unit_code: None };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Papers NOT found");
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "yearTaken: Path `yearTaken` is required.".into(),
            fields: vec!["yearTaken".into()],
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_store_error());
        assert_eq!(
            err.to_string(),
            "Paper validation failed: yearTaken: Path `yearTaken` is required."
        );
    }

    #[test]
    fn test_store_errors_are_bad_requests() {
        let err = AppError::Database(sea_orm::DbErr::Custom("connection reset".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_store_error());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_route_and_configuration_errors() {
        let err = AppError::RouteNotFound {
            method: "GET".into(),
            path: "/nowhere".into(),
        };
        assert_eq!(err.code(), ErrorCode::RouteNotFound);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Cannot GET /nowhere");

        let err = AppError::Configuration {
            message: "database.url is not set".into(),
        };
        assert_eq!(err.code().as_code(), 9002);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_store_error());
    }

    #[tokio::test]
    async fn test_not_found_bodies_carry_only_the_message() {
        let response = AppError::PaperNotFound {
            unit_code: "CS101".into(),
            year_taken: "2023".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Paper NOT found" }));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::PapersNotFound {
            unit_code: Some("HIS202".into()),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Papers NOT found" }));
    }
}
