//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. `AppError`
//! (and types convertible into it) become `HttpAppError` via `?` so every
//! failure renders consistently: status and body from the error metadata,
//! full detail logged server-side at the error's own level.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use zapimg_core::{AppError, ErrorMetadata, LogLevel};
use zapimg_payments::PaymentError;

/// Client-facing failure body. Every failure carries a `message`; `code` is
/// the machine-readable counterpart.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse.
/// Needed because of Rust's orphan rules - IntoResponse (external trait)
/// cannot be implemented for AppError (type from zapimg-core).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<PaymentError> for HttpAppError {
    fn from(err: PaymentError) -> Self {
        let app = match err {
            PaymentError::Timeout => {
                AppError::UpstreamTimeout("payment processor timed out".to_string())
            }
            other => AppError::Upstream(other.to_string()),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error.detailed_message(), error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error.detailed_message(), error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), error_type = error_type, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = Json(ErrorResponse {
            message: app_error.client_message(),
            code: app_error.error_code().to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_timeout_maps_to_upstream_timeout() {
        let HttpAppError(app) = PaymentError::Timeout.into();
        assert_eq!(app.error_code(), "UPSTREAM_TIMEOUT");
        assert_eq!(app.http_status_code(), 500);
    }

    #[test]
    fn test_payment_transport_maps_to_upstream() {
        let HttpAppError(app) = PaymentError::Transport("refused".to_string()).into();
        assert_eq!(app.error_code(), "UPSTREAM_ERROR");
        // Detail stays out of the client message
        assert!(!app.client_message().contains("refused"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            message: "File too large".to_string(),
            code: "PAYLOAD_TOO_LARGE".to_string(),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json.get("message").and_then(|v| v.as_str()), Some("File too large"));
        assert_eq!(
            json.get("code").and_then(|v| v.as_str()),
            Some("PAYLOAD_TOO_LARGE")
        );
    }
}
