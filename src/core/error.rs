use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::features::rate_limits::services::ReconcileError;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Failed to read request body: {0}")]
    PayloadRead(String),

    #[error("Failed to parse request body: {0}")]
    PayloadParse(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::UnsupportedContentType(ref content_type) => (
                StatusCode::BAD_REQUEST,
                format!("{} is not yet supported", content_type),
                None,
            ),
            AppError::PayloadRead(ref msg) => {
                tracing::error!("Failed to read request body: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to read request body".to_string(),
                    None,
                )
            }
            AppError::PayloadParse(ref msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to parse YAML".to_string(),
                Some(vec![msg.clone()]),
            ),
            AppError::Reconcile(ReconcileError::Translate(ref e)) => (
                StatusCode::BAD_REQUEST,
                e.to_string(),
                Some(vec![e.to_string()]),
            ),
            AppError::Reconcile(ref e @ ReconcileError::Step { .. }) => {
                tracing::error!("Reconciliation failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None)
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
