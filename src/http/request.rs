//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the caller sent one
//! - Turn the transport payload (query string or JSON body) into a `RawQuery`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - GET and POST differ only here; everything downstream sees `RawQuery`
//! - Body size limit and read deadline enforced while reading, before JSON parsing

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderName, HeaderValue, Method, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};
use uuid::Uuid;

use crate::error::{ProxyError, ProxyResult};
use crate::query::RawQuery;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header name form of [`X_REQUEST_ID`] for tower-http layers.
pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestId;

impl MakeRequestId for RequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(TowerRequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Transport-specific payload a query arrives in.
#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// Raw (still percent-encoded) query string of a GET.
    Query(Option<String>),
    /// Body bytes of a POST.
    JsonBody(Bytes),
}

impl InboundPayload {
    /// Split the payload off a request. Only GET and POST reach this point.
    ///
    /// A POST body must arrive in full within `read_timeout`.
    pub async fn from_request(
        request: Request<Body>,
        max_body_size: usize,
        read_timeout: Duration,
    ) -> ProxyResult<Self> {
        if request.method() == Method::GET {
            return Ok(Self::Query(request.uri().query().map(str::to_owned)));
        }

        let read = axum::body::to_bytes(request.into_body(), max_body_size);
        let body = match tokio::time::timeout(read_timeout, read).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Failed to read request body");
                return Err(ProxyError::MissingBody);
            }
            Err(_) => {
                tracing::debug!(
                    timeout_secs = read_timeout.as_secs(),
                    "Request body not received in time"
                );
                return Err(ProxyError::MissingBody);
            }
        };
        Ok(Self::JsonBody(body))
    }

    /// Extract the candidate range pair.
    pub fn into_raw_query(self) -> ProxyResult<RawQuery> {
        match self {
            Self::Query(query) => {
                let query = query.unwrap_or_default();
                let pairs = url::form_urlencoded::parse(query.as_bytes());
                Ok(RawQuery::from_pairs(pairs))
            }
            Self::JsonBody(body) => {
                if body.is_empty() {
                    return Err(ProxyError::MissingBody);
                }
                match serde_json::from_slice::<Value>(&body) {
                    Ok(Value::Object(map)) => Ok(RawQuery::from_object(map)),
                    Ok(_) => Ok(RawQuery::default()),
                    Err(_) => Err(ProxyError::MissingBody),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_query_string_is_decoded() {
        let payload = InboundPayload::Query(Some(
            "start_datetime=%31%30&end_datetime=20&extra=1".to_string(),
        ));
        let raw = payload.into_raw_query().unwrap();
        assert_eq!(raw.start(), Some(&json!("10")));
        assert_eq!(raw.end(), Some(&json!("20")));
    }

    #[test]
    fn test_absent_query_string_yields_empty_query() {
        let raw = InboundPayload::Query(None).into_raw_query().unwrap();
        assert_eq!(raw, RawQuery::default());
    }

    #[test]
    fn test_json_body() {
        let body = Bytes::from_static(br#"{"start_datetime": 1, "end_datetime": "2", "x": 3}"#);
        let raw = InboundPayload::JsonBody(body).into_raw_query().unwrap();
        assert_eq!(raw, RawQuery::new(Some(json!(1)), Some(json!("2"))));
    }

    #[test]
    fn test_empty_or_invalid_body_is_missing_body() {
        let bodies: [&[u8]; 3] = [b"", b"not_valid_json", b"{\"start_datetime\": 1"];
        for body in bodies {
            let err = InboundPayload::JsonBody(Bytes::copy_from_slice(body))
                .into_raw_query()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingBody);
        }
    }

    #[test]
    fn test_non_object_body_has_no_parameters() {
        let raw = InboundPayload::JsonBody(Bytes::from_static(b"[1, 2]"))
            .into_raw_query()
            .unwrap();
        assert_eq!(raw, RawQuery::default());
    }

    #[tokio::test]
    async fn test_oversized_body_is_missing_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from(vec![b' '; 128]))
            .unwrap();

        let err = InboundPayload::from_request(request, 16, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingBody);
    }

    #[tokio::test]
    async fn test_get_ignores_body() {
        let request = Request::builder()
            .uri("/?start_datetime=1&end_datetime=2")
            .body(Body::from("ignored"))
            .unwrap();

        let payload = InboundPayload::from_request(request, 16, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(matches!(
            payload,
            InboundPayload::Query(Some(q)) if q == "start_datetime=1&end_datetime=2"
        ));
    }

    #[test]
    fn test_request_id_ext_reads_header() {
        let request = Request::builder()
            .header(X_REQUEST_ID, "abc")
            .body(())
            .unwrap();
        assert_eq!(request.request_id(), "abc");
        assert_eq!(Request::new(()).request_id(), "unknown");
    }
}
