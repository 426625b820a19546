// tests/api_http.rs
//
// HTTP contract of the feed router, driven in-process with `tower::ServiceExt::oneshot`.

mod common;

use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serial_test::serial;
use tower::ServiceExt as _;

use common::{body_string, header as header_of, parse_rss, send};
use eschaton_rss::source::{RawItem, SourceReader};
use eschaton_rss::{router, AppState, FeedConfig, FeedError, FeedService, SourceKind};

fn reports_app(dir: &std::path::Path) -> axum::Router {
    let cfg = FeedConfig {
        source: SourceKind::Reports,
        reports_dir: dir.to_path_buf(),
        ..FeedConfig::default()
    };
    router(AppState::new(FeedService::from_config(cfg).unwrap()))
}

fn seeded_dir() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("daily-report-2026-02-12.md"),
        "## 🎯 Executive Summary\nAgents everywhere.",
    )
    .unwrap();
    tmp
}

#[tokio::test]
async fn get_returns_rss_with_feed_headers() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    let resp = send(&app, "GET", "/api/feed").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_of(&resp, "content-type"),
        Some("application/rss+xml; charset=utf-8")
    );
    assert_eq!(
        header_of(&resp, "cache-control"),
        Some("public, max-age=300, s-maxage=300")
    );
    assert_eq!(header_of(&resp, "x-generator"), Some("Eschaton RSS v2.0"));
    assert_eq!(header_of(&resp, "x-feed-type"), Some("RSS 2.0"));
    assert!(header_of(&resp, "etag").is_none());
    assert!(header_of(&resp, "x-feed-cache").is_none());

    let rss = parse_rss(&body_string(resp).await);
    assert_eq!(rss.channel.items.len(), 1);
    assert_eq!(rss.channel.items[0].description, "Agents everywhere.");
}

#[tokio::test]
async fn feed_xml_alias_serves_same_document() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    let a = body_string(send(&app, "GET", "/api/feed").await).await;
    let b = body_string(send(&app, "GET", "/feed.xml").await).await;
    // Only the build timestamp could differ, and it is pinned to the newest item.
    assert_eq!(a, b);
}

#[tokio::test]
async fn head_has_headers_but_no_body() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    let resp = send(&app, "HEAD", "/api/feed").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_of(&resp, "content-type"),
        Some("application/rss+xml; charset=utf-8")
    );
    assert!(body_string(resp).await.is_empty());
}

#[tokio::test]
async fn other_methods_are_rejected_with_allow_header() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    for method in ["POST", "PUT", "DELETE"] {
        let resp = send(&app, method, "/api/feed").await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        let allow: Vec<&str> = resp
            .headers()
            .get_all(header::ALLOW)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        assert!(allow.iter().any(|v| v.contains("GET")), "{method}: {allow:?}");
    }
}

#[tokio::test]
async fn options_is_answered_by_cors_layer() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    let resp = send(&app, "OPTIONS", "/feed.xml").await;
    assert!(resp.status().is_success());
    assert!(body_string(resp).await.is_empty());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    let req = Request::builder()
        .method(Method::GET)
        .uri("/api/feed")
        .header(header::ORIGIN, "https://reader.example")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(header_of(&resp, "access-control-allow-origin"), Some("*"));

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/feed")
        .header(header::ORIGIN, "https://reader.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(preflight).await.unwrap();
    assert!(resp.status().is_success());
    let methods = header_of(&resp, "access-control-allow-methods").unwrap_or_default();
    assert!(methods.contains("GET") && methods.contains("HEAD"), "{methods}");
}

#[tokio::test]
async fn health_is_ok() {
    let tmp = seeded_dir();
    let app = reports_app(tmp.path());

    let resp = send(&app, "GET", "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "ok");
}

struct Broken;

#[async_trait]
impl SourceReader for Broken {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>, FeedError> {
        Err(FeedError::SourceUnavailable("disk on fire <now>".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn reports_failure_is_500_with_escaped_xml_body() {
    let service = FeedService::new(FeedConfig::default(), Arc::new(Broken));
    let app = router(AppState::new(service));

    let resp = send(&app, "GET", "/api/feed").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        header_of(&resp, "content-type"),
        Some("application/xml; charset=utf-8")
    );
    assert_eq!(
        body_string(resp).await,
        "<?xml version='1.0'?><error><message>source unavailable: disk on fire &lt;now&gt;</message></error>"
    );
}

#[tokio::test]
#[serial]
async fn app_reads_reports_dir_from_environment() {
    let tmp = seeded_dir();
    std::env::set_var("FEED_SOURCE", "reports");
    std::env::set_var("REPORTS_DIR", tmp.path());
    std::env::set_var("FEED_TITLE", "Env Title");
    std::env::set_var("CACHE_MAX_AGE", "120");

    let app = eschaton_rss::app().expect("app from env");
    let resp = send(&app, "GET", "/api/feed").await;

    std::env::remove_var("FEED_SOURCE");
    std::env::remove_var("REPORTS_DIR");
    std::env::remove_var("FEED_TITLE");
    std::env::remove_var("CACHE_MAX_AGE");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_of(&resp, "cache-control"),
        Some("public, max-age=120, s-maxage=120")
    );
    let rss = parse_rss(&body_string(resp).await);
    assert_eq!(rss.channel.title, "Env Title");
    assert_eq!(rss.channel.items.len(), 1);
    assert!(rss.channel.items[0].title.starts_with("Env Title - February 12, 2026"));
}
