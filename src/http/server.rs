//! HTTP server setup and request handlers.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, optional timeout)
//! - Bind server to listener with graceful shutdown
//! - Run the gateway lifecycle for every proxied path:
//!   normalize → classify → access control → rewrite → encode → forward

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::forwarder::{build_client, Forwarder};
use crate::http::request::{request_id, ProxiedRequest, RequestUuid};
use crate::http::response::{moved_permanently, ForwardOutcome};
use crate::net::RelayTracker;
use crate::observability::metrics;
use crate::routing::{blob_to_raw, classify, encode_target, has_dot_segment, normalize, UrlShape};
use crate::security::{AccessController, Decision, RuleSet};

const NOT_FOUND_BODY: &str = "The requested resource was not found on this server.";
const ROBOTS_BODY: &str = "User-agent: *\r\nDisallow: /";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub access: AccessController,
    pub forwarder: Arc<Forwarder>,
    pub mirror_base: Arc<str>,
    pub max_request_body: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    tracker: RelayTracker,
}

impl HttpServer {
    /// Create a new HTTP server from configuration and the loaded rule set.
    pub fn new(config: ProxyConfig, rules: RuleSet) -> Result<Self, rustls::Error> {
        let client = build_client(&config.timeouts)?;
        let tracker = RelayTracker::new();

        let state = AppState {
            access: AccessController::new(Arc::new(rules)),
            forwarder: Arc::new(Forwarder::new(client, config.relay.clone(), tracker.clone())),
            mirror_base: Arc::from(config.relay.mirror_base.as_str()),
            max_request_body: config.relay.max_request_body,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            tracker,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(index))
            .route("/robots.txt", get(robots))
            .route("/{*path}", get(gateway).post(gateway))
            .with_state(state);

        if config.timeouts.request_secs > 0 {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// The router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn tracker(&self) -> &RelayTracker {
        &self.tracker
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let tracker = self.tracker.clone();
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!(
                    active_relays = tracker.active_count(),
                    "Shutdown signal received, draining"
                );
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /`: `?q=` bounces into the gateway, anything else is a 404.
async fn index(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("q") {
        Some(q) => moved_permanently(&format!("/{q}")),
        None => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
    }
}

async fn robots() -> &'static str {
    ROBOTS_BODY
}

/// Main gateway handler. `path` is the target URL, scheme optional.
async fn gateway(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request<Body>,
) -> Response {
    let request_id = request_id(request.headers()).to_string();
    let url = normalize(&path);

    // 1. Classify
    let classified = if has_dot_segment(&url) {
        None
    } else {
        classify(&url)
    };
    let Some(classified) = classified else {
        tracing::warn!(request_id = %request_id, url = %url, "Input matched no GitHub shape");
        metrics::record_request("invalid");
        return (StatusCode::FORBIDDEN, "Invalid input.").into_response();
    };

    // 2. Access control
    let decision = state.access.decide(&classified);
    tracing::debug!(
        request_id = %request_id,
        shape = %classified.shape,
        captures = ?classified.captures,
        decision = decision.as_str(),
        "Access decision"
    );
    if let Some((status, message)) = decision.denial() {
        tracing::info!(request_id = %request_id, url = %url, decision = decision.as_str(), "Request denied");
        metrics::record_request(decision.as_str());
        return (status, message).into_response();
    }
    if decision == Decision::RedirectMirror {
        metrics::record_request(decision.as_str());
        return moved_permanently(&format!("{}{}", state.mirror_base, url));
    }

    // 3. Rewrite and encode
    let url = if UrlShape::BlobOrRaw.matches(&url) {
        blob_to_raw(&url)
    } else {
        url
    };
    let target = encode_target(&url);

    // 4. Capture the request
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_request_body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            metrics::record_request("body_rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.").into_response();
        }
    };
    let proxied = ProxiedRequest::new(
        parts.method,
        &parts.headers,
        body,
        parts.uri.query().map(str::to_string),
    );

    // 5. Forward
    match state.forwarder.forward(&proxied, &target).await {
        Ok(outcome) => {
            metrics::record_request(match &outcome {
                ForwardOutcome::Relay(_) => "relayed",
                ForwardOutcome::Redirect(_) => "redirected",
            });
            outcome.into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, target = %target, kind = e.kind(), error = %e, "Upstream error");
            metrics::record_upstream_error(e.kind());
            metrics::record_request("error");
            e.into_response()
        }
    }
}
