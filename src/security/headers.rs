//! Header manipulation.
//!
//! # Responsibilities
//! - Strip origin-identifying headers from upstream responses
//! - Drop Host, framing and request-id headers from requests sent upstream
//!
//! # Design Decisions
//! - Names are matched exactly (case-insensitive, per HTTP)
//! - Everything not in the removal set passes through verbatim,
//!   `Content-Encoding` included

use axum::http::{header, HeaderMap, HeaderName};

/// Inbound headers that never travel upstream. The client library sets its
/// own Host and body framing; the request id is the gateway's own.
const REQUEST_HEADERS_TO_DROP: [HeaderName; 5] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    HeaderName::from_static("x-request-id"),
];

/// Removes a fixed set of headers from upstream responses.
#[derive(Debug, Clone, Default)]
pub struct HeaderFilter {
    names: Vec<HeaderName>,
}

impl HeaderFilter {
    /// Build from configured names. Names that are not valid header names are
    /// skipped; config validation reports them.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let names = names
            .iter()
            .filter_map(|n| HeaderName::from_bytes(n.as_ref().as_bytes()).ok())
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[HeaderName] {
        &self.names
    }

    /// Remove every configured header (all values) from `headers`.
    pub fn strip(&self, headers: &mut HeaderMap) {
        for name in &self.names {
            headers.remove(name);
        }
    }
}

/// Copy of the inbound headers suitable for the upstream request.
pub fn upstream_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    for name in &REQUEST_HEADERS_TO_DROP {
        headers.remove(name);
    }
    headers
}
