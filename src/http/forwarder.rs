//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send the proxied request to the origin with redirects disabled
//! - Offload oversized transfers to the mirror (size guard)
//! - Follow upstream redirects in a bounded loop (redirect guard)
//! - Strip origin headers and hand back a chunked body stream
//!
//! # Data Flow
//! ```text
//! target URL + ProxiedRequest
//!     → send (hop n)
//!     → Content-Length > size_limit?  → 301 mirror / origin
//!     → Location is a GitHub shape?   → 301 back through the gateway
//!     → Location elsewhere?           → hop n+1 (up to max_redirects)
//!     → strip headers, read first chunk, relay
//! ```

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Request, Uri};
use futures_util::stream::{self, StreamExt};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::config::{RelayConfig, TimeoutConfig};
use crate::http::error::ForwardError;
use crate::http::request::ProxiedRequest;
use crate::http::response::{rechunk, ForwardOutcome, ProxiedResponse};
use crate::net::RelayTracker;
use crate::observability::metrics;
use crate::routing::{classify, repair_scheme};
use crate::security::HeaderFilter;

/// Outbound client: plain HTTP or TLS, HTTP/1.1 or HTTP/2 via ALPN.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Build the outbound client.
///
/// It never follows redirects, never decompresses bodies and adds no
/// default headers beyond `Host`, so the origin sees only what the client
/// sent and the client sees the origin's bytes.
pub fn build_client(timeouts: &TimeoutConfig) -> Result<UpstreamClient, rustls::Error> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(timeouts.connect_secs.map(Duration::from_secs));

    let https = HttpsConnectorBuilder::new()
        .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    Ok(Client::builder(TokioExecutor::new()).build(https))
}

/// Relays requests to GitHub (or wherever its redirects lead).
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    config: RelayConfig,
    strip: HeaderFilter,
    tracker: RelayTracker,
}

impl Forwarder {
    pub fn new(client: UpstreamClient, config: RelayConfig, tracker: RelayTracker) -> Self {
        let strip = HeaderFilter::new(&config.strip_headers);
        Self {
            client,
            config,
            strip,
            tracker,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn tracker(&self) -> &RelayTracker {
        &self.tracker
    }

    /// Forward `request` to `target`, an already encoded absolute URL.
    pub async fn forward(
        &self,
        request: &ProxiedRequest,
        target: &str,
    ) -> Result<ForwardOutcome, ForwardError> {
        let mut url = match &request.query {
            Some(query) => format!("{target}?{query}"),
            None => target.to_string(),
        };
        url = repair_scheme(url);
        let mut previous: Option<String> = None;
        let mut hops = 0u32;

        loop {
            let uri = upstream_uri(&url)?;

            tracing::debug!(url = %url, hop = hops, method = %request.method, "Forwarding upstream");

            let mut upstream = Request::new(Full::new(request.body.clone()));
            *upstream.method_mut() = request.method.clone();
            *upstream.uri_mut() = uri;
            *upstream.headers_mut() = request.headers.clone();

            let start = Instant::now();
            let response = self.client.request(upstream).await?;
            metrics::record_upstream_duration(start);

            // Size guard
            if let Some(length) = declared_length(response.headers()) {
                if length > self.config.size_limit {
                    let location = self.oversize_location(request, &url, previous.as_deref());
                    tracing::info!(
                        url = %url,
                        content_length = length,
                        size_limit = self.config.size_limit,
                        location = %location,
                        "Upstream body over size limit, redirecting"
                    );
                    return Ok(ForwardOutcome::Redirect(location));
                }
            }

            // Redirect guard
            if let Some(value) = response.headers().get(header::LOCATION) {
                let location = resolve_location(&url, value)?;
                if classify(&location).is_some() {
                    tracing::debug!(location = %location, "Upstream redirected to GitHub, sending client back through the gateway");
                    return Ok(ForwardOutcome::Redirect(format!("/{location}")));
                }
                if hops >= self.config.max_redirects {
                    tracing::warn!(url = %url, location = %location, hops, "Redirect limit reached");
                    return Err(ForwardError::TooManyRedirects(self.config.max_redirects));
                }
                hops += 1;
                metrics::record_redirect_hop();
                previous = Some(std::mem::replace(&mut url, location));
                continue;
            }

            return self.relay(response).await.map(ForwardOutcome::Relay);
        }
    }

    /// Where to send the client when the origin body is too large.
    ///
    /// Callers without a region signal, or from a restricted region, go to the
    /// mirror (with the pre-redirect URL when there was one); everyone else
    /// goes straight to the origin.
    pub fn oversize_location(
        &self,
        request: &ProxiedRequest,
        url: &str,
        previous: Option<&str>,
    ) -> String {
        let restricted = match request.header(&self.config.region_header) {
            None => true,
            Some(region) => self.config.restricted_regions.iter().any(|r| r == region),
        };
        if restricted {
            format!("{}{}", self.config.mirror_base, previous.unwrap_or(url))
        } else {
            url.to_string()
        }
    }

    async fn relay(
        &self,
        response: hyper::Response<Incoming>,
    ) -> Result<ProxiedResponse, ForwardError> {
        let (parts, incoming) = response.into_parts();
        let status = parts.status;
        let mut headers = parts.headers;
        self.strip.strip(&mut headers);

        let guard = self.tracker.track();
        let relay_id = guard.id();
        let mut body = rechunk(
            incoming.into_data_stream().boxed(),
            self.config.chunk_size,
            Some(guard),
        );

        // Failures before the first chunk still become a 500.
        let first = body.next().await.transpose()?;
        tracing::debug!(relay_id = %relay_id, status = %status, "Relaying upstream body");

        Ok(ProxiedResponse {
            status,
            headers,
            body: stream::iter(first.map(Ok)).chain(body).boxed(),
        })
    }
}

/// Validate `url` and convert it for the client.
fn upstream_uri(url: &str) -> Result<Uri, ForwardError> {
    let invalid = |reason: String| ForwardError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    parsed.as_str().parse::<Uri>().map_err(|e| invalid(e.to_string()))
}

/// Parsed `Content-Length`, if present and numeric.
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Absolute form of a `Location` header, resolved against `current`.
fn resolve_location(current: &str, value: &HeaderValue) -> Result<String, ForwardError> {
    let raw = value
        .to_str()
        .map_err(|_| ForwardError::InvalidLocation(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;

    match Url::parse(raw) {
        Ok(_) => Ok(raw.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(current)
            .and_then(|base| base.join(raw))
            .map(String::from)
            .map_err(|_| ForwardError::InvalidLocation(raw.to_string())),
        Err(_) => Err(ForwardError::InvalidLocation(raw.to_string())),
    }
}
