//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single range endpoint
//! - Wire up middleware (CORS headers, request ID, tracing, outer timeout)
//! - Reject HEAD even though axum routes it alongside GET
//! - Run the request pipeline: normalize → validate → select timeout →
//!   forward → normalize response, short-circuiting to the error mapper
//! - Bind server to listener and shut down gracefully

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, ProxyConfig, ValidationError};
use crate::error::ProxyResult;
use crate::http::client::BackendClient;
use crate::http::request::{request_id_header, InboundPayload, RequestId, RequestIdExt};
use crate::http::response::NormalizedResponse;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::query;
use crate::resilience::TimeoutPolicy;
use crate::security::headers::{CorsHeaders, ALLOWED_METHODS};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub timeouts: Arc<TimeoutPolicy>,
    pub max_body_size: usize,
    pub body_read_timeout: Duration,
}

/// HTTP server for the range proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The configuration is validated here as well, so servers built
    /// programmatically get the same checks as ones loaded from a file.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let backend = BackendClient::new(&config.backend).map_err(|e| {
            ConfigError::Validation(vec![ValidationError::BackendUrl {
                url: config.backend.url.clone(),
                reason: e.to_string(),
            }])
        })?;
        let cors = CorsHeaders::from_config(&config.cors)
            .map_err(|_| ConfigError::Validation(vec![ValidationError::AllowHeaders]))?;

        let state = AppState {
            backend,
            timeouts: Arc::new(TimeoutPolicy::new(config.timeouts.tiers.clone())),
            max_body_size: config.security.max_body_size,
            body_read_timeout: Duration::from_secs(config.security.body_read_timeout_secs),
        };

        let router = Self::build_router(&config, &cors, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, cors: &CorsHeaders, state: AppState) -> Router {
        let endpoint = get(range_handler)
            .post(range_handler)
            .options(preflight_handler)
            .fallback(method_not_allowed);

        let router = Router::new()
            .route(&config.endpoint.path, endpoint)
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::map_response(json_request_timeout));

        cors.apply(router)
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id_header(), RequestId))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.config.endpoint.path,
            backend = %self.config.backend.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// GET/POST handler for the range endpoint.
async fn range_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    if method == Method::HEAD {
        return method_not_allowed(method).await;
    }

    let started = Instant::now();
    let request_id = request.request_id().to_string();

    tracing::debug!(request_id = %request_id, method = %method, "Range query received");

    match proxy_query(&state, request, &request_id).await {
        Ok(normalized) => {
            tracing::info!(
                request_id = %request_id,
                status = %normalized.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Range query proxied"
            );
            metrics::record_request(method.as_str(), normalized.status.as_u16(), "ok", started);
            normalized.into_response()
        }
        Err(e) => {
            let kind = e.kind();
            if kind.is_client_error() {
                tracing::warn!(request_id = %request_id, kind = kind.as_str(), error = %e, "Rejected range query");
            } else {
                tracing::error!(request_id = %request_id, kind = kind.as_str(), error = %e, "Range query failed");
            }
            metrics::record_request(method.as_str(), kind.status_code().as_u16(), kind.as_str(), started);
            e.into_response()
        }
    }
}

/// The request pipeline. Validation happens before any backend call.
async fn proxy_query(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
) -> ProxyResult<NormalizedResponse> {
    let payload =
        InboundPayload::from_request(request, state.max_body_size, state.body_read_timeout).await?;
    let raw = payload.into_raw_query()?;
    let query = query::validate(&raw)?;

    let timeout = state.timeouts.select(query.span_secs());
    let response = state.backend.forward(&query, timeout, request_id).await?;

    NormalizedResponse::from_backend(response)
}

/// CORS pre-flight: 200, empty body, headers added by the CORS layers.
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
        Json(json!({ "error": format!("Method {} not allowed", method) })),
    )
        .into_response()
}

/// The outer timeout answers with an empty 408; give it the JSON error body.
async fn json_request_timeout(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }
    tracing::error!("Request exceeded the outer deadline");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(json!({ "error": "Request did not complete in time" })),
    )
        .into_response()
}

async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("No endpoint at {}", uri.path()) })),
    )
        .into_response()
}
