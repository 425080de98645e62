//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream relay behaviour (size guard, mirror, redirects, headers).
    pub relay: RelayConfig,

    /// Locations of the ACL rule files.
    pub rules: RulesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Timeout configuration.
///
/// Both values are opt-in. Without them the gateway relies on the transport
/// defaults, which keeps long archive downloads alive.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Time allowed to produce a response head, in seconds. 0 disables it.
    pub request_secs: u64,
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Largest declared upstream `Content-Length` that is streamed through.
    pub size_limit: u64,

    /// Base URL of the secondary mirror. The target URL is appended verbatim.
    pub mirror_base: String,

    /// Size of the chunks handed to the client.
    pub chunk_size: usize,

    /// Upstream redirects followed before the request fails.
    pub max_redirects: u32,

    /// Largest inbound request body accepted for forwarding.
    pub max_request_body: usize,

    /// Inbound header carrying the caller's region.
    pub region_header: String,

    /// Regions that are always sent to the mirror for oversized files.
    pub restricted_regions: Vec<String>,

    /// Upstream response headers removed before relaying.
    pub strip_headers: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            mirror_base: DEFAULT_MIRROR_BASE.to_string(),
            chunk_size: 10 * 1024,
            max_redirects: 5,
            max_request_body: 10 * 1024 * 1024,
            region_header: "CF-IPCountry".to_string(),
            restricted_regions: vec!["CN".to_string()],
            strip_headers: DEFAULT_STRIP_HEADERS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// 999 GiB, i.e. effectively unlimited.
pub const DEFAULT_SIZE_LIMIT: u64 = 1024 * 1024 * 1024 * 999;

pub const DEFAULT_MIRROR_BASE: &str = "https://ghfast.top/";

/// Headers that leak origin infrastructure or clash with the relay's own framing.
pub const DEFAULT_STRIP_HEADERS: &[&str] = &[
    "Transfer-Encoding",
    "Strict-Transport-Security",
    "Access-Control-Allow-Origin",
    "Clear-Site-Data",
    "Content-Security-Policy",
    "Content-Security-Policy-Report-Only",
    "Cross-Origin-Resource-Policy",
    "X-GitHub-Request-Id",
    "X-Fastly-Request-ID",
    "Via",
    "X-Served-By",
    "X-Cache",
    "X-Cache-Hits",
    "X-Timer",
    "Expires",
    "Source-Age",
];

/// ACL rule file locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    pub whitelist: String,
    pub blacklist: String,
    pub passlist: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            whitelist: "whitelist.txt".to_string(),
            blacklist: "blacklist.txt".to_string(),
            passlist: "passlist.txt".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
