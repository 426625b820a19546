// src/api.rs
//! HTTP surface: one feed handler (mounted at `/api/feed` and `/feed.xml`) plus `/health`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use metrics::counter;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::SourceKind;
use crate::error::FeedError;
use crate::service::{FeedService, RenderedFeed};

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";
pub const X_FEED_CACHE: &str = "x-feed-cache";

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
}

impl AppState {
    pub fn new(feed: FeedService) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // OPTIONS never reaches the handler: the CORS layer answers it.
    let feed: MethodRouter<AppState> = get(serve_feed).fallback(method_not_allowed);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/feed", feed.clone())
        .route("/feed.xml", feed)
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// GET (and HEAD, which axum answers from the same handler without a body).
async fn serve_feed(State(state): State<AppState>) -> Response {
    counter!("feed_requests_total").increment(1);
    let feed = &state.feed;
    match feed.render().await {
        Ok(rendered) => feed_response(rendered, feed.cache_window_secs()),
        Err(e) => {
            error!(error = %e, kind = e.kind(), source = ?feed.source_kind(), "feed generation failed");
            counter!("feed_errors_total", "kind" => e.kind()).increment(1);
            error_response(feed.source_kind(), &e)
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOWED_METHODS)],
    )
        .into_response()
}

pub fn cache_control(window_secs: u64) -> String {
    format!("public, max-age={window_secs}, s-maxage={window_secs}")
}

fn feed_response(rendered: RenderedFeed, window_secs: u64) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(RSS_CONTENT_TYPE));
    if let Ok(v) = HeaderValue::from_str(&cache_control(window_secs)) {
        headers.insert(header::CACHE_CONTROL, v);
    }
    headers.insert(
        HeaderName::from_static("x-generator"),
        HeaderValue::from_static("Eschaton RSS v2.0"),
    );
    headers.insert(
        HeaderName::from_static("x-feed-type"),
        HeaderValue::from_static("RSS 2.0"),
    );
    if let Some(etag) = rendered.etag.as_deref() {
        if let Ok(v) = HeaderValue::from_str(&format!("\"{etag}\"")) {
            headers.insert(header::ETAG, v);
        }
    }
    if let Some(status) = rendered.cache {
        headers.insert(
            HeaderName::from_static(X_FEED_CACHE),
            HeaderValue::from_static(status.as_str()),
        );
    }

    (StatusCode::OK, headers, Body::from(rendered.body.to_string())).into_response()
}

/// 500 with a structured body: JSON for the remote variant, XML for reports.
pub fn error_response(kind: SourceKind, err: &FeedError) -> Response {
    let message = err.to_string();
    match kind {
        SourceKind::Molthub => {
            let body = serde_json::json!({ "error": message }).to_string();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
        SourceKind::Reports => {
            let body = format!(
                "<?xml version='1.0'?><error><message>{}</message></error>",
                html_escape::encode_text(&message)
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
                body,
            )
                .into_response()
        }
    }
}
