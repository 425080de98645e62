//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (chunk size > 0, addresses parse)
//! - Validate header names used by the relay
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("relay.mirror_base `{0}` is not an absolute http(s) URL")]
    MirrorBase(String),
    #[error("relay.chunk_size must be greater than zero")]
    ChunkSize,
    #[error("relay.region_header `{0}` is not a valid header name")]
    RegionHeader(String),
    #[error("relay.strip_headers entry `{0}` is not a valid header name")]
    StripHeader(String),
    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let mirror_ok = Url::parse(&config.relay.mirror_base)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !mirror_ok {
        errors.push(ValidationError::MirrorBase(config.relay.mirror_base.clone()));
    }

    if config.relay.chunk_size == 0 {
        errors.push(ValidationError::ChunkSize);
    }

    if HeaderName::from_bytes(config.relay.region_header.as_bytes()).is_err() {
        errors.push(ValidationError::RegionHeader(config.relay.region_header.clone()));
    }

    for name in &config.relay.strip_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::StripHeader(name.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
