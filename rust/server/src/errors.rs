/// Error reporting for twentyone_server
///
/// This module provides:
/// - The transport-neutral error response body
/// - Status code and severity mapping through [`IntoErrorResponse`]
/// - Severity-based error logging
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use twentyone_engine::errors::{ErrorKind, GameError};

/// Standard error body handed to the request-handling layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "not_your_turn")
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (structured data)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Validation failures - expected, normal operation
    Client,
    /// Infrastructure failures - unexpected, needs investigation
    Server,
    /// Session integrity at risk
    Critical,
}

/// Trait for turning errors into transport responses with proper logging
pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;

    fn error_code(&self) -> &'static str;

    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity {
        if self.status_code().is_server_error() {
            ErrorSeverity::Server
        } else {
            ErrorSeverity::Client
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    /// Build the status and body, logging at the error's severity
    fn into_reply(self) -> (StatusCode, ErrorResponse)
    where
        Self: Sized,
    {
        let status = self.status_code();
        let response = self.to_error_response();
        log_error(self.severity(), status, &response);
        (status, response)
    }
}

fn log_error(severity: ErrorSeverity, status: StatusCode, error: &ErrorResponse) {
    match severity {
        ErrorSeverity::Client => {
            tracing::info!(status = status.as_u16(), code = %error.error, "client error: {}", error.message);
        }
        ErrorSeverity::Server => {
            tracing::error!(status = status.as_u16(), code = %error.error, "server error: {}", error.message);
        }
        ErrorSeverity::Critical => {
            tracing::error!(
                status = status.as_u16(),
                code = %error.error,
                critical = true,
                "critical error: {}",
                error.message
            );
        }
    }
}

/// HTTP status for an engine error kind
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        ErrorKind::InvariantViolation => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoErrorResponse for GameError {
    fn status_code(&self) -> StatusCode {
        status_for_kind(self.kind())
    }

    fn error_code(&self) -> &'static str {
        self.code()
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            GameError::NotYourTurn { expected, actual } => Some(serde_json::json!({
                "expected_player": expected,
                "player": actual,
            })),
            GameError::NotEnoughPlayers { required, actual } => Some(serde_json::json!({
                "required": required,
                "actual": actual,
            })),
            GameError::SessionFull { max } => Some(serde_json::json!({ "max_players": max })),
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::InvariantViolation => ErrorSeverity::Critical,
            _ => ErrorSeverity::Client,
        }
    }
}
