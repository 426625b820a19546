//! Eschaton RSS service entrypoint.
//! Boots the Axum HTTP server serving the generated feed.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing::info;

use eschaton_rss::telemetry::{self, Metrics};
use eschaton_rss::{router, AppState, FeedConfig, FeedService};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init();

    let cfg = FeedConfig::load()?;
    info!(
        source = ?cfg.source,
        cache_window_secs = cfg.cache_window_secs(),
        api_key_present = cfg.molthub.api_key.is_some(),
        "feed configuration loaded"
    );

    let metrics = Metrics::init(cfg.cache_window_secs())?;
    let service = FeedService::from_config(cfg).context("building feed service")?;

    let app = router(AppState::new(service)).merge(metrics.router());

    Ok(app.into())
}
