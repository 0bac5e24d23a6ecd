//! Proxy error taxonomy and the error → response mapping.
//!
//! Every failure in the request pipeline ends up as a [`ProxyError`]. Turning
//! it into a response never fails: the body is always `{"error": message}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors that can abort a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// POST without a readable JSON body.
    #[error("Request body is missing or is not valid JSON")]
    MissingBody,

    /// A timestamp key is absent or null.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A timestamp value cannot be converted to an integer.
    #[error("Parameter {name} must be an integer, got {value}")]
    InvalidParameterType { name: &'static str, value: String },

    /// `start_datetime` is after `end_datetime`.
    #[error("start_datetime ({start}) must not be greater than end_datetime ({end})")]
    InvalidTimeRange { start: i64, end: i64 },

    /// The backend did not answer within the selected tier.
    #[error("Backend did not respond within {0} seconds")]
    BackendTimeout(u64),

    /// Connection-level failure talking to the backend.
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// The backend answered with something that is not JSON.
    #[error("Backend returned a malformed response: {0}")]
    MalformedBackendResponse(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`ProxyError`], used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingBody,
    MissingParameter,
    InvalidParameterType,
    InvalidTimeRange,
    BackendTimeout,
    BackendUnreachable,
    MalformedBackendResponse,
    UnknownInternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingBody => "missing_body",
            ErrorKind::MissingParameter => "missing_parameter",
            ErrorKind::InvalidParameterType => "invalid_parameter_type",
            ErrorKind::InvalidTimeRange => "invalid_time_range",
            ErrorKind::BackendTimeout => "backend_timeout",
            ErrorKind::BackendUnreachable => "backend_unreachable",
            ErrorKind::MalformedBackendResponse => "malformed_backend_response",
            ErrorKind::UnknownInternalError => "unknown_internal_error",
        }
    }

    /// Status code returned to the caller for this kind.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::MissingBody
            | ErrorKind::MissingParameter
            | ErrorKind::InvalidParameterType
            | ErrorKind::InvalidTimeRange => StatusCode::BAD_REQUEST,
            ErrorKind::BackendTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::BackendUnreachable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::MalformedBackendResponse | ErrorKind::UnknownInternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for mistakes made by the caller, as opposed to backend failures.
    pub fn is_client_error(self) -> bool {
        self.status_code() == StatusCode::BAD_REQUEST
    }
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::MissingBody => ErrorKind::MissingBody,
            ProxyError::MissingParameter(_) => ErrorKind::MissingParameter,
            ProxyError::InvalidParameterType { .. } => ErrorKind::InvalidParameterType,
            ProxyError::InvalidTimeRange { .. } => ErrorKind::InvalidTimeRange,
            ProxyError::BackendTimeout(_) => ErrorKind::BackendTimeout,
            ProxyError::BackendUnreachable(_) => ErrorKind::BackendUnreachable,
            ProxyError::MalformedBackendResponse(_) => ErrorKind::MalformedBackendResponse,
            ProxyError::Internal(_) => ErrorKind::UnknownInternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

/// Result type for the request pipeline.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
