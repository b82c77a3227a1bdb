//! API middleware and shared state
//!
//! Contains the application state handed to every handler and the JSON
//! error envelope all endpoints reject with.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AlertsConfig;
use crate::services::{LedgerError, OccupancyLedger, ReferenceError, ReferenceService};

/// Application state containing shared services.
///
/// The ledger is constructed once at startup from the durable store and
/// passed by handle to every request handler; there is no ambient access.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<OccupancyLedger>,
    pub reference: Arc<ReferenceService>,
    pub alerts: AlertsConfig,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("INVALID_INPUT", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "INVALID_INPUT" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "ALREADY_PARKED" | "CATEGORY_FULL" | "NOT_PARKED" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::InvalidInput(_) => Self::new("INVALID_INPUT", err.to_string()),
            LedgerError::AlreadyParked(_) => Self::new("ALREADY_PARKED", err.to_string()),
            LedgerError::CategoryFull(_) => Self::new("CATEGORY_FULL", err.to_string()),
            LedgerError::NotParked(_) => Self::new("NOT_PARKED", err.to_string()),
            LedgerError::Internal(e) => {
                tracing::error!("ledger failure: {:#}", e);
                Self::internal_error("ledger operation failed")
            }
        }
    }
}

impl From<ReferenceError> for ApiError {
    fn from(err: ReferenceError) -> Self {
        match err {
            ReferenceError::NotFound(_) => Self::not_found(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_map_to_statuses() {
        let cases = [
            ("INVALID_INPUT", StatusCode::BAD_REQUEST),
            ("NOT_FOUND", StatusCode::NOT_FOUND),
            ("ALREADY_PARKED", StatusCode::CONFLICT),
            ("CATEGORY_FULL", StatusCode::CONFLICT),
            ("NOT_PARKED", StatusCode::CONFLICT),
            ("INTERNAL_ERROR", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new(code, "msg").into_response();
            assert_eq!(response.status(), status, "code {}", code);
        }
    }

    #[test]
    fn test_ledger_error_conversion() {
        let err: ApiError = LedgerError::AlreadyParked("ABC123".to_string()).into();
        assert_eq!(err.error.code, "ALREADY_PARKED");
        assert!(err.error.message.contains("ABC123"));
    }
}
