//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Capture the inbound request as an immutable [`ProxiedRequest`]
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is read once and replayed on every redirect hop

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::security::headers::upstream_request_headers;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Inbound request as the forwarder sees it.
#[derive(Debug, Clone)]
pub struct ProxiedRequest {
    pub method: Method,
    /// Inbound headers without Host and body framing.
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Inbound query string, appended to the first upstream URL.
    pub query: Option<String>,
}

impl ProxiedRequest {
    pub fn new(method: Method, inbound: &HeaderMap, body: Bytes, query: Option<String>) -> Self {
        Self {
            method,
            headers: upstream_request_headers(inbound),
            body,
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// Header value as a string, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
