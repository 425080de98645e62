//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path (scheme optional)
//!     → target.rs (normalize scheme, reject . and .. segments)
//!     → shape.rs (classify against the five GitHub grammars)
//!     → Return: ClassifiedUrl or no match (403)
//!
//! After access control allows the request:
//!     → target.rs (blob → raw, percent-encode)
//! ```
//!
//! # Design Decisions
//! - Grammars compiled once, immutable at runtime
//! - Deterministic: same input always yields the same shape
//! - First match wins (fixed priority order)

pub mod shape;
pub mod target;

pub use shape::{classify, ClassifiedUrl, UrlShape};
pub use target::{blob_to_raw, encode_target, has_dot_segment, normalize, repair_scheme};
