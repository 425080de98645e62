//! GitHub URL shape classification.
//!
//! # Responsibilities
//! - Hold the five URL grammars the gateway accepts
//! - Test them in priority order, first match wins
//! - Extract the author (and repo) identifiers used by access control
//!
//! # Design Decisions
//! - Grammars compiled once, on first use
//! - Author/repo captures are lazy, so `a/b/archive/x/archive/y` yields `a`, `b`

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// The kinds of GitHub resource the gateway relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlShape {
    /// `github.com/{author}/{repo}/releases/...` or `.../archive/...`
    ArchiveOrRelease,
    /// `github.com/{author}/{repo}/blob/...` or `.../raw/...`
    BlobOrRaw,
    /// `github.com/{author}/{repo}/info/...` or `.../git-...`
    GitMeta,
    /// `raw.githubusercontent.com/{author}/{repo}/{ref}/{path}`
    RawContent,
    /// `gist.githubusercontent.com/{author}/{id}/...`
    Gist,
}

impl UrlShape {
    /// Every shape, in matching priority.
    pub const ALL: [UrlShape; 5] = [
        UrlShape::ArchiveOrRelease,
        UrlShape::BlobOrRaw,
        UrlShape::GitMeta,
        UrlShape::RawContent,
        UrlShape::Gist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlShape::ArchiveOrRelease => "archive_or_release",
            UrlShape::BlobOrRaw => "blob_or_raw",
            UrlShape::GitMeta => "git_meta",
            UrlShape::RawContent => "raw_content",
            UrlShape::Gist => "gist",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            UrlShape::ArchiveOrRelease => &ARCHIVE_OR_RELEASE,
            UrlShape::BlobOrRaw => &BLOB_OR_RAW,
            UrlShape::GitMeta => &GIT_META,
            UrlShape::RawContent => &RAW_CONTENT,
            UrlShape::Gist => &GIST,
        }
    }

    /// Whether `url` matches this shape's grammar.
    pub fn matches(&self, url: &str) -> bool {
        self.pattern().is_match(url)
    }
}

impl fmt::Display for UrlShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static ARCHIVE_OR_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?github\.com/(?P<author>.+?)/(?P<repo>.+?)/(?:releases|archive)/.*$")
        .expect("valid regex")
});

static BLOB_OR_RAW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?github\.com/(?P<author>.+?)/(?P<repo>.+?)/(?:blob|raw)/.*$")
        .expect("valid regex")
});

static GIT_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?github\.com/(?P<author>.+?)/(?P<repo>.+?)/(?:info|git-).*$")
        .expect("valid regex")
});

static RAW_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?raw\.(?:githubusercontent|github)\.com/(?P<author>.+?)/(?P<repo>.+?)/.+?/.+$",
    )
    .expect("valid regex")
});

static GIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?gist\.(?:githubusercontent|github)\.com/(?P<author>.+?)/.+?/.+$")
        .expect("valid regex")
});

/// Output of [`classify`]: the shape plus its captured identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedUrl {
    pub shape: UrlShape,
    /// `[author, repo]`, or `[author]` for gists.
    pub captures: Vec<String>,
}

impl ClassifiedUrl {
    pub fn author(&self) -> &str {
        &self.captures[0]
    }

    pub fn repo(&self) -> Option<&str> {
        self.captures.get(1).map(String::as_str)
    }
}

/// Classify `url` against the known shapes.
///
/// Returns `None` when no grammar matches; such input must never be forwarded.
pub fn classify(url: &str) -> Option<ClassifiedUrl> {
    UrlShape::ALL.iter().find_map(|shape| {
        let caps = shape.pattern().captures(url)?;
        let captures = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_string())
            .collect();
        Some(ClassifiedUrl { shape: *shape, captures })
    })
}
