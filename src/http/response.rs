//! Response handling and transformation.
//!
//! # Responsibilities
//! - Coerce the backend reply into a JSON object for the client
//! - Pass the backend status code through
//!
//! # Design Decisions
//! - A body that is not JSON is a backend fault (500), not a client one
//! - Non-object JSON (lists, scalars) is wrapped as `{"data": ...}`
//! - Error responses are produced by `ProxyError`, not here

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::error::{ProxyError, ProxyResult};
use crate::http::client::BackendResponse;

/// What the caller receives on success.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub status: StatusCode,
    pub body: Map<String, Value>,
}

impl NormalizedResponse {
    /// Normalize a backend reply.
    pub fn from_backend(response: BackendResponse) -> ProxyResult<Self> {
        let value: Value = serde_json::from_slice(&response.body)
            .map_err(|e| ProxyError::MalformedBackendResponse(e.to_string()))?;

        let body = match value {
            Value::Object(map) => map,
            other => {
                let mut wrapped = Map::with_capacity(1);
                wrapped.insert("data".to_string(), other);
                wrapped
            }
        };

        Ok(Self {
            status: response.status,
            body,
        })
    }
}

impl IntoResponse for NormalizedResponse {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}
