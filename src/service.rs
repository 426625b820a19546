// src/service.rs
//! Feed pipeline: Source Reader → Extractor → Feed Builder, behind the Cache Gate.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::histogram;
use tracing::info;

use crate::cache::{CacheStatus, FeedCache};
use crate::config::{FeedConfig, SourceKind};
use crate::error::FeedError;
use crate::extract::{self, FeedItem};
use crate::feed::{build_rss, Channel};
use crate::source::molthub::MolthubSource;
use crate::source::reports::ReportsDir;
use crate::source::{SourceReader, MAX_ITEMS};

/// A generated document plus response metadata.
#[derive(Debug, Clone)]
pub struct RenderedFeed {
    pub body: Arc<str>,
    /// Content fingerprint; only when the Cache Gate is active.
    pub etag: Option<String>,
    pub cache: Option<CacheStatus>,
}

pub struct FeedService {
    cfg: FeedConfig,
    channel: Channel,
    source: Arc<dyn SourceReader>,
    cache: Option<FeedCache>,
    cache_key: String,
}

impl FeedService {
    /// Build the source strategy named by the configuration.
    pub fn from_config(cfg: FeedConfig) -> Result<Self, FeedError> {
        let source: Arc<dyn SourceReader> = match cfg.source {
            SourceKind::Reports => Arc::new(ReportsDir::new(cfg.reports_dir.clone())),
            SourceKind::Molthub => Arc::new(MolthubSource::new(cfg.molthub.clone())?),
        };
        Ok(Self::new(cfg, source))
    }

    /// Only the remote variant gets a Cache Gate; reports are re-read per request.
    pub fn new(cfg: FeedConfig, source: Arc<dyn SourceReader>) -> Self {
        let cache = match cfg.source {
            SourceKind::Reports => None,
            SourceKind::Molthub => Some(FeedCache::from_secs(cfg.molthub.cache_seconds)),
        };
        let cache_key = match cfg.source {
            SourceKind::Reports => source.name().to_string(),
            SourceKind::Molthub => format!("{}:{}", source.name(), cfg.molthub.submolt_id),
        };
        Self {
            channel: Channel::for_config(&cfg),
            cfg,
            source,
            cache,
            cache_key,
        }
    }

    pub fn with_cache(mut self, cache: Option<FeedCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.cfg
    }

    pub fn source_kind(&self) -> SourceKind {
        self.cfg.source
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Freshness window advertised to HTTP caches.
    pub fn cache_window_secs(&self) -> u64 {
        self.cfg.cache_window_secs()
    }

    /// Read, extract and build without touching the cache.
    pub async fn generate(&self) -> Result<String, FeedError> {
        let t0 = Instant::now();
        let now = Utc::now();

        let raw = self.source.fetch_latest().await?;
        let items: Vec<FeedItem> = raw
            .iter()
            .take(MAX_ITEMS)
            .map(|r| extract::extract(r, &self.cfg, now))
            .collect();
        let xml = build_rss(&self.channel, &items, now)?;

        histogram!("feed_generate_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        info!(
            source = self.source.name(),
            items = items.len(),
            bytes = xml.len(),
            "feed generated"
        );
        Ok(xml)
    }

    pub async fn render(&self) -> Result<RenderedFeed, FeedError> {
        match &self.cache {
            Some(cache) => {
                let (entry, status) = cache
                    .get_or_generate(&self.cache_key, || self.generate())
                    .await?;
                Ok(RenderedFeed {
                    body: entry.body,
                    etag: Some(entry.fingerprint),
                    cache: Some(status),
                })
            }
            None => Ok(RenderedFeed {
                body: Arc::from(self.generate().await?),
                etag: None,
                cache: None,
            }),
        }
    }
}
