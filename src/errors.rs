use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
    /// HTTP status code, repeated in the body
    pub status: u16,
}

/// Errors raised by the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("failed to {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: DbErr,
    },
}

impl RepositoryError {
    /// Wraps a driver error with the operation that produced it.
    /// `RecordNotFound`/`RecordNotUpdated` become `NotFound`.
    pub fn database(operation: &'static str) -> impl FnOnce(DbErr) -> Self {
        move |source| match source {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepositoryError::NotFound,
            source => RepositoryError::Database { operation, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("product not found")]
    ProductNotFound,

    #[error("product name is required")]
    ProductNameRequired,

    #[error("invalid product name")]
    InvalidName,

    #[error("price must be greater than 0")]
    InvalidPrice,

    #[error("stock must be non-negative")]
    InvalidStock,

    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    #[error("insufficient stock")]
    InsufficientStock,

    #[error("stock limit exceeded")]
    StockLimitExceeded,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProductNotFound => StatusCode::NOT_FOUND,
            Self::ProductNameRequired
            | Self::InvalidName
            | Self::InvalidPrice
            | Self::InvalidStock
            | Self::InvalidQuantity
            | Self::StockLimitExceeded
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Persistence failures return a generic message to avoid leaking details.
    pub fn response_message(&self) -> String {
        match self {
            Self::Repository(RepositoryError::Database { .. }) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorResponse {
        error: message,
        status: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        error_response(status, self.response_message())
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(service_error) => service_error.into_response(),
            ApiError::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
        }
    }
}
