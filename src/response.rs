use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::gateway::GatewayError;
use crate::services::turns::TurnError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "PERSISTENCE_ERROR",
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<TurnError> for AppError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::Validation(message) => Self::validation(message),
            TurnError::NotFound(message) => Self::not_found(message),
            TurnError::Persistence(store) => Self::persistence(store.to_string()),
            TurnError::Gateway(gateway) => {
                let message = gateway.to_string();
                match gateway {
                    GatewayError::Timeout => {
                        Self::new(StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT", message)
                    }
                    GatewayError::RateLimit => Self::new(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "GATEWAY_RATE_LIMITED",
                        message,
                    ),
                    GatewayError::Connection(_) => Self::new(
                        StatusCode::BAD_GATEWAY,
                        "GATEWAY_CONNECTION_ERROR",
                        message,
                    ),
                    GatewayError::Provider(_) => {
                        Self::new(StatusCode::BAD_GATEWAY, "GATEWAY_PROVIDER_ERROR", message)
                    }
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}
