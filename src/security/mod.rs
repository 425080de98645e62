//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Classified URL:
//!     → access_control.rs (whitelist, blacklist, passlist)
//!     → rules.rs (immutable rule tables, loaded at startup)
//!
//! Upstream exchange:
//!     → headers.rs (drop Host on the way out, strip origin headers on the way back)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a non-empty whitelist denies everything it does not list
//! - Rule tables are never mutated after startup

pub mod access_control;
pub mod headers;
pub mod rules;

pub use access_control::{AccessController, Decision};
pub use headers::HeaderFilter;
pub use rules::{AclRule, RuleSet};
