//! Target URL preparation.
//!
//! Turns the path the client asked for into the URL sent upstream:
//! scheme normalization, the blob → raw rewrite and percent-encoding.

/// Normalize client input into an absolute URL.
///
/// Adds `https://` when the input carries no scheme and repairs the
/// `https:/` artifact left by front ends that collapse `//`.
/// Applying it to its own output changes nothing.
pub fn normalize(raw: &str) -> String {
    let url = if raw.starts_with("http") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    repair_scheme(url)
}

/// Restore a collapsed scheme separator (`https:/host` → `https://host`).
pub fn repair_scheme(url: String) -> String {
    for scheme in ["https:/", "http:/"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            if rest.starts_with('/') {
                return url;
            }
            return format!("{scheme}/{rest}");
        }
    }
    url
}

/// Whether the path of `url` has a `.` or `..` segment.
///
/// Such a URL would be resolved upstream to a different author or repo than
/// the one access control saw, so it must never be classified.
pub fn has_dot_segment(url: &str) -> bool {
    let path = url.split_once("://").map_or(url, |(_, rest)| rest);
    path.split('/').skip(1).any(|seg| seg == "." || seg == "..")
}

/// Point a blob view at GitHub's raw endpoint. Only the first `/blob/` changes.
pub fn blob_to_raw(url: &str) -> String {
    url.replacen("/blob/", "/raw/", 1)
}

/// Percent-encode `url`, keeping `/` and `:` literal.
///
/// Everything outside `A-Z a-z 0-9 - _ . ~` is escaped, `%` included, so an
/// already-encoded path is encoded a second time.
pub fn encode_target(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for (i, segment) in url.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        for (j, part) in segment.split(':').enumerate() {
            if j > 0 {
                out.push(':');
            }
            out.push_str(&urlencoding::encode(part));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(
            normalize("github.com/a/b/archive/x.zip"),
            "https://github.com/a/b/archive/x.zip"
        );
    }

    #[test]
    fn test_normalize_repairs_collapsed_separator() {
        assert_eq!(
            normalize("https:/github.com/a/b/archive/x.zip"),
            "https://github.com/a/b/archive/x.zip"
        );
        assert_eq!(
            normalize("http:/github.com/a/b/archive/x.zip"),
            "http://github.com/a/b/archive/x.zip"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "github.com/a/b/archive/x.zip",
            "https:/github.com/a/b/archive/x.zip",
            "http://github.com/a/b/blob/main/f",
            "raw.githubusercontent.com/a/b/main/f",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_dot_segments_detected() {
        assert!(has_dot_segment(
            "https://github.com/octocat/hello-world/blob/main/../../../../evil/secret/raw/main/f"
        ));
        assert!(has_dot_segment("https://github.com/a/./b/archive/x"));
        assert!(has_dot_segment("github.com/a/b/archive/.."));
        assert!(!has_dot_segment("https://github.com/a/b/archive/v1.0..v2.0.zip"));
        assert!(!has_dot_segment("https://github.com/a/.github/raw/main/.env"));
        assert!(!has_dot_segment("https://github.com/a/b/archive/x.zip"));
    }

    #[test]
    fn test_blob_to_raw_rewrites_first_only() {
        assert_eq!(
            blob_to_raw("https://github.com/a/b/blob/main/blob/f.txt"),
            "https://github.com/a/b/raw/main/blob/f.txt"
        );
    }

    #[test]
    fn test_encode_keeps_slash_and_colon() {
        assert_eq!(
            encode_target("https://github.com/a/b/archive/v1.0-rc_1~x.zip"),
            "https://github.com/a/b/archive/v1.0-rc_1~x.zip"
        );
    }

    #[test]
    fn test_encode_escapes_reserved_and_unicode() {
        assert_eq!(
            encode_target("https://github.com/a/b/raw/main/my file?#.txt"),
            "https://github.com/a/b/raw/main/my%20file%3F%23.txt"
        );
        assert_eq!(
            encode_target("https://github.com/a/b/raw/main/é"),
            "https://github.com/a/b/raw/main/%C3%A9"
        );
    }

    #[test]
    fn test_encode_double_encodes_percent() {
        assert_eq!(
            encode_target("https://github.com/a/b/raw/main/my%20file"),
            "https://github.com/a/b/raw/main/my%2520file"
        );
    }
}
