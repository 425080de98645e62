//! Response handling and transformation.
//!
//! # Responsibilities
//! - Re-chunk upstream bodies into fixed-size pieces for the client
//! - Keep the upstream connection accounted for until the body is done
//! - Turn forwarder outcomes into client responses (relay or 301)
//!
//! # Design Decisions
//! - Streaming responses never buffer more than one chunk
//! - Content encoding is passed through untouched
//! - An error mid-body ends the stream; the client sees a truncated transfer

use std::fmt;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::BytesMut;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::http::error::ForwardError;
use crate::net::RelayGuard;

/// Lazily produced response body. Finite and not restartable.
pub type BodyStream = BoxStream<'static, Result<Bytes, hyper::Error>>;

/// Upstream response after sanitization.
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl fmt::Debug for ProxiedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxiedResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// What the forwarder decided to send back.
#[derive(Debug)]
pub enum ForwardOutcome {
    /// Stream the origin response.
    Relay(ProxiedResponse),
    /// Send the client elsewhere with a 301.
    Redirect(String),
}

impl IntoResponse for ForwardOutcome {
    fn into_response(self) -> Response {
        match self {
            ForwardOutcome::Relay(relayed) => {
                let mut response = Response::new(Body::from_stream(relayed.body));
                *response.status_mut() = relayed.status;
                *response.headers_mut() = relayed.headers;
                response
            }
            ForwardOutcome::Redirect(location) => moved_permanently(&location),
        }
    }
}

/// `301 Moved Permanently` pointing at `location`.
pub fn moved_permanently(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => ForwardError::InvalidLocation(location.to_string()).into_response(),
    }
}

struct Rechunk<E> {
    upstream: BoxStream<'static, Result<Bytes, E>>,
    buf: BytesMut,
    chunk_size: usize,
    done: bool,
    guard: Option<RelayGuard>,
}

/// Regroup `upstream` into chunks of exactly `chunk_size` bytes (the last one
/// may be shorter).
///
/// `guard` is held until the returned stream is exhausted, fails or is
/// dropped, whichever happens first.
pub fn rechunk<E>(
    upstream: BoxStream<'static, Result<Bytes, E>>,
    chunk_size: usize,
    guard: Option<RelayGuard>,
) -> BoxStream<'static, Result<Bytes, E>>
where
    E: fmt::Display + Send + 'static,
{
    let state = Rechunk {
        upstream,
        buf: BytesMut::with_capacity(chunk_size),
        chunk_size: chunk_size.max(1),
        done: false,
        guard,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.buf.len() >= st.chunk_size {
                let chunk = st.buf.split_to(st.chunk_size).freeze();
                return Some((Ok(chunk), st));
            }
            if st.done {
                st.guard = None;
                if st.buf.is_empty() {
                    return None;
                }
                let chunk = st.buf.split().freeze();
                return Some((Ok(chunk), st));
            }
            match st.upstream.next().await {
                Some(Ok(bytes)) => st.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    if let Some(guard) = &st.guard {
                        tracing::warn!(relay_id = %guard.id(), error = %e, "Upstream body failed");
                    }
                    st.done = true;
                    st.buf.clear();
                    st.guard = None;
                    return Some((Err(e), st));
                }
                None => st.done = true,
            }
        }
    })
    .boxed()
}
