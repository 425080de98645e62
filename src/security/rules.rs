//! ACL rules and the rule store.
//!
//! A rule is a `/`-separated tuple such as `octocat/hello-world` or
//! `*/blocked-repo`. Rule files hold one rule per line.

use std::fs;
use std::path::Path;

use crate::config::RulesConfig;

/// Token matching any author when used as the first segment.
pub const WILDCARD: &str = "*";

/// An ordered tuple of path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    segments: Vec<String>,
}

impl AclRule {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one rule line. Whitespace anywhere inside a segment is dropped.
    pub fn parse(line: &str) -> Self {
        Self::new(
            line.split('/')
                .map(|seg| seg.chars().filter(|c| !c.is_whitespace()).collect::<String>()),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this rule covers the captured identifiers.
    ///
    /// Either the rule is a prefix of `captures`, or it is `*/{repo}` and the
    /// second capture equals `repo`. A bare `*` covers every author.
    pub fn matches(&self, captures: &[String]) -> bool {
        let rule = self.segments.as_slice();
        if rule.is_empty() {
            return false;
        }
        if rule.len() <= captures.len() && captures[..rule.len()] == *rule {
            return true;
        }
        match rule {
            [first] => first == WILDCARD,
            [first, repo, ..] => {
                first == WILDCARD && captures.get(1).is_some_and(|c| c == repo)
            }
            [] => false,
        }
    }
}

/// Parse a rule file's contents. Blank lines are skipped.
pub fn parse_rules(content: &str) -> Vec<AclRule> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(AclRule::parse)
        .collect()
}

/// Read a rule file. A missing or unreadable file yields no rules.
pub fn load_rules(path: &Path) -> Vec<AclRule> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let rules = parse_rules(&content);
            tracing::info!(path = %path.display(), count = rules.len(), "Loaded rules");
            rules
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Rule file unavailable, using empty list");
            Vec::new()
        }
    }
}

/// The three rule lists, built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub whitelist: Vec<AclRule>,
    pub blacklist: Vec<AclRule>,
    pub passlist: Vec<AclRule>,
}

impl RuleSet {
    pub fn new(whitelist: Vec<AclRule>, blacklist: Vec<AclRule>, passlist: Vec<AclRule>) -> Self {
        Self {
            whitelist,
            blacklist,
            passlist,
        }
    }

    pub fn load(config: &RulesConfig) -> Self {
        Self::new(
            load_rules(Path::new(&config.whitelist)),
            load_rules(Path::new(&config.blacklist)),
            load_rules(Path::new(&config.passlist)),
        )
    }
}

/// Whether any rule in `rules` covers `captures`.
pub fn any_match(rules: &[AclRule], captures: &[String]) -> bool {
    rules.iter().any(|rule| rule.matches(captures))
}
