//! Network resource subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder opens an upstream response
//!     → connection.rs (RelayTracker::track hands out a RelayGuard)
//!     → guard travels inside the client body stream
//!     → body finished / client gone / upstream error
//!     → guard dropped, upstream connection released, count decremented
//! ```

pub mod connection;

pub use connection::{RelayGuard, RelayId, RelayTracker};
