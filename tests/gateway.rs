//! End-to-end tests of the gateway router, served in-process.
//!
//! None of these reach the network: every case is decided before the
//! forwarder would contact GitHub.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use gh_proxy::config::ProxyConfig;
use gh_proxy::http::HttpServer;
use gh_proxy::security::{AclRule, RuleSet};

const RELEASE: &str = "https://github.com/bob/tool/releases/download/v1.0/tool.tar.gz";

fn rules(whitelist: &[&[&str]], blacklist: &[&[&str]], passlist: &[&[&str]]) -> RuleSet {
    let build = |list: &[&[&str]]| -> Vec<AclRule> {
        list.iter().map(|r| AclRule::new(r.iter().copied())).collect()
    };
    RuleSet::new(build(whitelist), build(blacklist), build(passlist))
}

fn router_with(config: ProxyConfig, rules: RuleSet) -> Router {
    HttpServer::new(config, rules).unwrap().router()
}

fn router(rules: RuleSet) -> Router {
    router_with(ProxyConfig::default(), rules)
}

async fn send(router: Router, method: Method, uri: &str, body: Body) -> Response {
    router
        .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
        .await
        .unwrap()
}

async fn get(router: Router, uri: &str) -> Response {
    send(router, Method::GET, uri, Body::empty()).await
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_robots_disallows_everything() {
    let response = get(router(RuleSet::default()), "/robots.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "User-agent: *\r\nDisallow: /");
}

#[tokio::test]
async fn test_index_without_query_is_not_found() {
    let response = get(router(RuleSet::default()), "/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_text(response).await,
        "The requested resource was not found on this server."
    );
}

#[tokio::test]
async fn test_index_query_redirects_into_gateway() {
    let response = get(router(RuleSet::default()), "/?q=github.com/bob/tool").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), "/github.com/bob/tool");
}

#[tokio::test]
async fn test_non_github_input_is_rejected() {
    let response = get(router(RuleSet::default()), "/https://example.com/file.zip").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Invalid input.");
}

#[tokio::test]
async fn test_dot_segments_cannot_escape_whitelisted_repo() {
    let router = router(rules(&[&["octocat", "hello-world"]], &[], &[]));
    for path in [
        "/github.com/octocat/hello-world/blob/main/../../../../evil/secret/raw/main/f",
        "/https://github.com/octocat/hello-world/./blob/main/f",
    ] {
        let response = get(router.clone(), path).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
        assert_eq!(body_text(response).await, "Invalid input.");
    }
}

#[tokio::test]
async fn test_dotted_file_names_are_not_dot_segments() {
    let response = get(
        router(rules(&[], &[], &[&["octocat"]])),
        "/github.com/octocat/hello-world/blob/main/.github/ci..yml",
    )
    .await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert!(location(&response).starts_with("https://ghfast.top/"));
}

#[tokio::test]
async fn test_post_is_routed_to_gateway() {
    let response = send(
        router(RuleSet::default()),
        Method::POST,
        "/https://example.com/upload",
        Body::from("data"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_author_outside_whitelist_is_forbidden() {
    let response = get(router(rules(&[&["alice"]], &[], &[])), &format!("/{RELEASE}")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Forbidden by white list.");
}

#[tokio::test]
async fn test_blacklisted_repo_is_forbidden() {
    let response = get(
        router(rules(&[&["bob"]], &[&["*", "tool"]], &[])),
        &format!("/{RELEASE}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Forbidden by black list.");
}

#[tokio::test]
async fn test_passlisted_author_goes_to_mirror() {
    let response = get(router(rules(&[], &[], &[&["bob"]])), &format!("/{RELEASE}")).await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), format!("https://ghfast.top/{RELEASE}"));
}

#[tokio::test]
async fn test_missing_scheme_is_normalized_before_mirroring() {
    let response = get(
        router(rules(&[], &[], &[&["bob"]])),
        "/github.com/bob/tool/releases/download/v1.0/tool.tar.gz",
    )
    .await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), format!("https://ghfast.top/{RELEASE}"));
}

#[tokio::test]
async fn test_collapsed_scheme_slashes_are_repaired() {
    let response = get(
        router(rules(&[], &[], &[&["bob"]])),
        "/https:/github.com/bob/tool/releases/download/v1.0/tool.tar.gz",
    )
    .await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), format!("https://ghfast.top/{RELEASE}"));
}

#[tokio::test]
async fn test_mirror_base_is_configurable() {
    let mut config = ProxyConfig::default();
    config.relay.mirror_base = "https://mirror.example/".into();

    let response = get(
        router_with(config, rules(&[], &[], &[&["bob"]])),
        &format!("/{RELEASE}"),
    )
    .await;
    assert_eq!(location(&response), format!("https://mirror.example/{RELEASE}"));
}

#[tokio::test]
async fn test_oversized_request_body_is_rejected() {
    let mut config = ProxyConfig::default();
    config.relay.max_request_body = 4;

    let response = send(
        router_with(config, RuleSet::default()),
        Method::POST,
        "/https://github.com/bob/tool/git-upload-pack",
        Body::from("far more than four bytes"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_text(response).await, "Request body too large.");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let response = get(router(RuleSet::default()), "/robots.txt").await;
    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);
}
