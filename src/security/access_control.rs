//! Access control over classified GitHub URLs.
//!
//! # Responsibilities
//! - Enforce the whitelist as a closed allow-set when it is non-empty
//! - Deny blacklisted authors/repos
//! - Send passlisted authors/repos straight to the mirror
//!
//! # Design Decisions
//! - Order is fixed: whitelist, blacklist, passlist
//! - Denials never contact the origin

use std::sync::Arc;

use axum::http::StatusCode;

use crate::routing::ClassifiedUrl;
use crate::security::rules::{any_match, RuleSet};

/// Outcome of the access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    DenyWhitelist,
    DenyBlacklist,
    RedirectMirror,
}

impl Decision {
    /// Status and body for decisions that end the request with a denial.
    pub fn denial(&self) -> Option<(StatusCode, &'static str)> {
        match self {
            Decision::DenyWhitelist => Some((StatusCode::FORBIDDEN, "Forbidden by white list.")),
            Decision::DenyBlacklist => Some((StatusCode::FORBIDDEN, "Forbidden by black list.")),
            Decision::Allow | Decision::RedirectMirror => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::DenyWhitelist => "deny_whitelist",
            Decision::DenyBlacklist => "deny_blacklist",
            Decision::RedirectMirror => "redirect_mirror",
        }
    }
}

/// Evaluates classified URLs against the shared rule set.
#[derive(Debug, Clone)]
pub struct AccessController {
    rules: Arc<RuleSet>,
}

impl AccessController {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn decide(&self, url: &ClassifiedUrl) -> Decision {
        let captures = url.captures.as_slice();

        if !self.rules.whitelist.is_empty() && !any_match(&self.rules.whitelist, captures) {
            return Decision::DenyWhitelist;
        }
        if any_match(&self.rules.blacklist, captures) {
            return Decision::DenyBlacklist;
        }
        if any_match(&self.rules.passlist, captures) {
            return Decision::RedirectMirror;
        }
        Decision::Allow
    }
}
