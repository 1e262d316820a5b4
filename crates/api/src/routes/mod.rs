//! HTTP route handlers.

pub mod health;
pub mod members;
pub mod metrics;
pub mod ordering;
pub mod products;

use serde::Serialize;

/// Response envelope shared by all non-error endpoints.
#[derive(Serialize)]
pub struct CommonResponse<T: Serialize> {
    pub result: T,
    pub status_code: u16,
    pub status_message: String,
}

impl<T: Serialize> CommonResponse<T> {
    pub fn new(result: T, status: axum::http::StatusCode, message: impl Into<String>) -> Self {
        Self {
            result,
            status_code: status.as_u16(),
            status_message: message.into(),
        }
    }
}
