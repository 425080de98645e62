//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → server.rs gateway handler (classify, access control)
//!     → request.rs (immutable ProxiedRequest)
//!     → forwarder.rs (size guard, redirect guard, header stripping)
//!     → response.rs (fixed-size chunk stream, 301s)
//!     → Send to client
//! ```

pub mod error;
pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use error::{ForwardError, TransportErrorKind};
pub use forwarder::{build_client, Forwarder};
pub use request::{ProxiedRequest, RequestUuid, X_REQUEST_ID};
pub use response::{ForwardOutcome, ProxiedResponse};
pub use server::HttpServer;
