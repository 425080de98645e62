//! Upstream relay lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique relay IDs for tracing
//! - Count upstream bodies that are still being streamed
//! - Release the count on every exit path (completion, client disconnect,
//!   upstream error) through a drop guard

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Global atomic counter for relay IDs.
/// Relaxed ordering is enough since we only need uniqueness.
static RELAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one streamed upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(u64);

impl RelayId {
    pub fn new() -> Self {
        Self(RELAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for RelayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "relay-{}", self.0)
    }
}

/// Counts live upstream relays.
#[derive(Debug, Clone, Default)]
pub struct RelayTracker {
    active_count: Arc<AtomicU64>,
}

impl RelayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new relay. The returned guard must live as long as the
    /// upstream body it accounts for.
    pub fn track(&self) -> RelayGuard {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_relays(active);
        RelayGuard {
            active_count: Arc::clone(&self.active_count),
            id: RelayId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that keeps a relay counted. Decrements the count when dropped.
#[derive(Debug)]
pub struct RelayGuard {
    active_count: Arc<AtomicU64>,
    id: RelayId,
}

impl RelayGuard {
    pub fn id(&self) -> RelayId {
        self.id
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_relays(active);
        tracing::trace!(relay_id = %self.id, "Relay closed");
    }
}
