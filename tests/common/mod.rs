// tests/common/mod.rs
// Shared helpers: RSS shape for parsing responses back, and body reading.
#![allow(dead_code)]

use axum::body::{self, Body};
use axum::http::{Request, Response};
use axum::Router;
use serde::Deserialize;
use tower::ServiceExt as _;

pub const BODY_LIMIT: usize = 4 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct Rss {
    #[serde(rename = "@version")]
    pub version: String,
    pub channel: Channel,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub title: String,
    pub description: String,
    pub language: String,
    #[serde(rename = "lastBuildDate")]
    pub last_build_date: String,
    pub generator: String,
    #[serde(rename = "item", default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct Item {
    pub title: String,
    pub link: Option<String>,
    pub guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub author: Option<String>,
    #[serde(rename = "category", default)]
    pub categories: Vec<String>,
    pub description: String,
    pub comments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Guid {
    #[serde(rename = "@isPermaLink")]
    pub is_permalink: String,
    #[serde(rename = "$text")]
    pub value: String,
}

pub fn parse_rss(xml: &str) -> Rss {
    quick_xml::de::from_str(xml).unwrap_or_else(|e| panic!("invalid RSS ({e}):\n{xml}"))
}

pub async fn send(app: &Router, method: &str, uri: &str) -> Response<Body> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    app.clone().oneshot(req).await.expect("router response")
}

pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub fn header<'a>(resp: &'a Response<Body>, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}
