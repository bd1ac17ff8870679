//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use smarthq_core::CoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`CoreError`] to a status code and `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::NotConnected => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Not connected to SmartHQ".to_owned(),
            ),
            CoreError::DeviceNotFound { .. } => {
                (StatusCode::NOT_FOUND, "Device not found".to_owned())
            }
            CoreError::ServiceNotFound { .. } => {
                (StatusCode::NOT_FOUND, "Service not found".to_owned())
            }
            CoreError::SendFailed { message } => {
                tracing::error!(error = %message, "command send failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to send command: {message}"),
                )
            }
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
