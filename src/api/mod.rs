//! HTTP boundary for the task-queue service.
//!
//! Maps URL paths, request bodies, and the facade's error kinds to status
//! codes. Successful responses carry JSON; client faults carry a plain-text
//! message with a 4xx status.

pub mod handlers;
pub mod rest;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

use crate::core::error::ServiceError;
use crate::service::QueueService;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
}

/// A client-visible error: a status code plus a plain-text message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match err {
            ServiceError::InvalidArgument(_) | ServiceError::PreconditionFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, error = %self.message, "client_fault");
        (self.status, self.message).into_response()
    }
}
