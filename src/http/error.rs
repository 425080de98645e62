//! Forwarding errors.
//!
//! Every failure while talking to the origin collapses into [`ForwardError`],
//! which the gateway turns into a single `500 server error {detail}` reply.

use std::error::Error as StdError;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Coarse classification of a transport failure, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Body,
    Request,
}

impl TransportErrorKind {
    /// Kind of a failure to obtain a response head.
    pub fn of_request(err: &hyper_util::client::legacy::Error) -> Self {
        if timed_out(err) {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Request
        }
    }

    /// Kind of a failure while reading a response body.
    pub fn of_body(err: &hyper::Error) -> Self {
        if timed_out(err) {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::Body
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Request => "request",
        }
    }
}

/// Whether anything in the source chain of `err` is a timeout.
fn timed_out(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_timeout() {
                return true;
            }
        }
        current = e.source();
    }
    false
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("{source}")]
    Transport {
        kind: TransportErrorKind,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("invalid upstream url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid redirect location {0:?}")]
    InvalidLocation(String),

    #[error("too many redirects ({0})")]
    TooManyRedirects(u32),
}

impl ForwardError {
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Transport { kind, .. } => kind.as_str(),
            ForwardError::InvalidUrl { .. } => "invalid_url",
            ForwardError::InvalidLocation(_) => "invalid_location",
            ForwardError::TooManyRedirects(_) => "too_many_redirects",
        }
    }
}

impl From<hyper_util::client::legacy::Error> for ForwardError {
    fn from(source: hyper_util::client::legacy::Error) -> Self {
        ForwardError::Transport {
            kind: TransportErrorKind::of_request(&source),
            source: Box::new(source),
        }
    }
}

impl From<hyper::Error> for ForwardError {
    fn from(source: hyper::Error) -> Self {
        ForwardError::Transport {
            kind: TransportErrorKind::of_body(&source),
            source: Box::new(source),
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/html; charset=UTF-8")],
            format!("server error {self}"),
        )
            .into_response()
    }
}
