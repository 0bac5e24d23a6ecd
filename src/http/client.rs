//! Forwarding client for the single backend.
//!
//! # Responsibilities
//! - Rebuild the outbound body from the validated query only
//! - Issue exactly one POST per query, never retried
//! - Bound connect, send and body read by the selected tier timeout
//! - Classify failures as timeout vs. unreachable

use std::time::Duration;

use axum::body::{Body, Bytes};
use http_body_util::LengthLimitError;
use hyper::{header, Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::BackendConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::query::TimeRangeQuery;

/// Upper bound on a backend response body we are willing to buffer.
const MAX_BACKEND_BODY: usize = 32 * 1024 * 1024;

/// Raw reply from the backend.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Pooled HTTP client bound to the configured backend URL.
#[derive(Clone)]
pub struct BackendClient {
    uri: Uri,
    client: Client<HttpConnector, Body>,
    body_limit: usize,
}

impl BackendClient {
    /// Build a client for an already validated backend configuration.
    pub fn new(config: &BackendConfig) -> ProxyResult<Self> {
        let uri: Uri = config
            .url
            .parse()
            .map_err(|e| ProxyError::Internal(format!("invalid backend url {}: {}", config.url, e)))?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            uri,
            client,
            body_limit: MAX_BACKEND_BODY,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Forward one validated query, waiting at most `timeout`.
    pub async fn forward(
        &self,
        query: &TimeRangeQuery,
        timeout: Duration,
        request_id: &str,
    ) -> ProxyResult<BackendResponse> {
        let payload = serde_json::to_vec(query)
            .map_err(|e| ProxyError::Internal(format!("failed to encode query: {}", e)))?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.uri.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if !request_id.is_empty() {
            builder = builder.header(X_REQUEST_ID, request_id);
        }
        let request = builder
            .body(Body::from(payload))
            .map_err(|e| ProxyError::Internal(format!("failed to build backend request: {}", e)))?;

        tracing::debug!(
            request_id = %request_id,
            backend = %self.uri,
            start = query.start(),
            end = query.end(),
            timeout_secs = timeout.as_secs(),
            "Forwarding query"
        );

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ProxyError::BackendUnreachable(e.to_string()))?;
            let status = response.status();
            let body = axum::body::to_bytes(Body::new(response.into_body()), self.body_limit)
                .await
                .map_err(|e| {
                    let e = e.into_inner();
                    if e.is::<LengthLimitError>() {
                        ProxyError::MalformedBackendResponse(format!(
                            "body exceeds {} bytes",
                            self.body_limit
                        ))
                    } else {
                        ProxyError::BackendUnreachable(format!("failed to read response body: {}", e))
                    }
                })?;
            Ok::<_, ProxyError>(BackendResponse { status, body })
        };

        let result = match time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::BackendTimeout(timeout.as_secs())),
        };

        match &result {
            Ok(response) => {
                tracing::debug!(request_id = %request_id, status = %response.status, "Backend responded");
                metrics::record_backend_call("ok", timeout);
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, backend = %self.uri, error = %e, "Backend call failed");
                metrics::record_backend_call(e.kind().as_str(), timeout);
            }
        }

        result
    }
}
