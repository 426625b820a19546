// src/telemetry.rs
//! Logging and metrics setup for the binaries.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "eschaton_rss=info,warn";

/// Install the global subscriber. `FEED_LOG_FORMAT=json` switches to JSON lines.
/// A subscriber installed earlier (e.g. by the Shuttle runtime) is left in place.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("FEED_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured freshness window.
    pub fn init(cache_window_secs: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("feed_requests_total", "Feed requests received.");
        describe_counter!("feed_cache_hits_total", "Feeds served from the cache.");
        describe_counter!("feed_cache_misses_total", "Feeds regenerated.");
        describe_counter!("feed_errors_total", "Failed feed requests by error kind.");
        describe_counter!(
            "feed_source_skipped_total",
            "Source entries skipped (unreadable file, invalid date)."
        );
        describe_histogram!("feed_generate_ms", "Feed generation time in milliseconds.");
        describe_gauge!("feed_cache_window_secs", "Configured freshness window.");

        gauge!("feed_cache_window_secs").set(cache_window_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
