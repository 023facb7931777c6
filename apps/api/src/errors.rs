use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::RenderError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Public messages are generic. Causes are logged where they happen, with
/// the request span attached, so nothing is logged here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment verification failed")]
    PaymentRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PaymentRequired => (
                StatusCode::BAD_REQUEST,
                "PAYMENT_VERIFICATION_FAILED",
                "Payment verification failed".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Store(StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "File not found".to_string(),
            ),
            AppError::Render(RenderError::Timeout(_)) => (
                StatusCode::GATEWAY_TIMEOUT,
                "RENDER_TIMEOUT",
                "Resume rendering timed out".to_string(),
            ),
            AppError::Render(RenderError::Saturated(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RENDER_BUSY",
                "The renderer is busy, please retry shortly".to_string(),
            ),
            AppError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RENDER_FAILED",
                "Failed to generate resume PDF".to_string(),
            ),
            AppError::Store(StoreError::ReadFailed(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Failed to read generated resume".to_string(),
            ),
            AppError::Store(StoreError::WriteFailed(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Failed to store generated resume".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = Json(json!({
            "success": false,
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
