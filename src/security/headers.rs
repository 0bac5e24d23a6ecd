//! CORS response headers.
//!
//! # Responsibilities
//! - Stamp the CORS headers on every response, errors and 404/405 included
//!
//! # Design Decisions
//! - Headers are overridden, not appended, so a backend cannot widen them
//! - Values are built once when the router is built

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::schema::CorsConfig;

/// Methods the endpoint answers.
pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Header always present in `Access-Control-Allow-Headers`.
pub const BASE_ALLOWED_HEADER: &str = "Content-Type";

/// Pre-built CORS header values.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsHeaders {
    pub fn from_config(config: &CorsConfig) -> Result<Self, header::InvalidHeaderValue> {
        Ok(Self {
            allow_headers: HeaderValue::from_str(&allow_headers_value(config))?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// Wrap a router so every response carries the CORS headers.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                self.allow_headers.clone(),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_MAX_AGE,
                self.max_age.clone(),
            ))
    }
}

/// `Content-Type` followed by the configured extras, comma separated.
pub fn allow_headers_value(config: &CorsConfig) -> String {
    std::iter::once(BASE_ALLOWED_HEADER)
        .chain(
            config
                .extra_allow_headers
                .iter()
                .map(|h| h.trim())
                .filter(|h| !h.is_empty() && !h.eq_ignore_ascii_case(BASE_ALLOWED_HEADER)),
        )
        .collect::<Vec<_>>()
        .join(", ")
}
