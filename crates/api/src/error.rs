//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use ordering::OrderingError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No valid identity on the request.
    Unauthorized(String),
    /// The identity lacks the required role.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The request conflicts with current resource state.
    Conflict(String),
    /// Backing infrastructure is unreachable; the request may be retried.
    Unavailable(String),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": kind, "message": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<OrderingError> for ApiError {
    fn from(err: OrderingError) -> Self {
        match &err {
            OrderingError::MemberNotFound(_)
            | OrderingError::ProductNotFound(_)
            | OrderingError::OrderNotFound(_) => ApiError::NotFound(err.to_string()),
            OrderingError::InsufficientStock { .. } | OrderingError::AlreadyCanceled(_) => {
                ApiError::Conflict(err.to_string())
            }
            OrderingError::InvalidQuantity { .. } | OrderingError::EmptyOrder => {
                ApiError::BadRequest(err.to_string())
            }
            OrderingError::Unavailable(_) => ApiError::Unavailable(err.to_string()),
            OrderingError::Repository(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::MemberNotFound(_)
            | DomainError::ProductNotFound(_)
            | DomainError::OrderNotFound(_) => ApiError::NotFound(err.to_string()),
            DomainError::DuplicateEmail(_) | DomainError::AlreadyCanceled(_) => {
                ApiError::Conflict(err.to_string())
            }
            DomainError::InvalidQuantity { .. } | DomainError::EmptyOrder => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
