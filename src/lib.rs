// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod service;
pub mod source;
pub mod telemetry;

pub use crate::api::{router, AppState};
pub use crate::config::{FeedConfig, SourceKind};
pub use crate::error::FeedError;
pub use crate::service::{FeedService, RenderedFeed};

/// Build the full application router from the environment, as the service binary does.
pub fn app() -> anyhow::Result<axum::Router> {
    use anyhow::Context;

    let cfg = FeedConfig::load()?;
    let service = FeedService::from_config(cfg).context("building feed service")?;
    Ok(router(AppState::new(service)))
}
