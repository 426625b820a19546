// src/source/molthub.rs
//! Remote strategy: posts of one submolt from the Molthub content API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::MolthubConfig;
use crate::error::FeedError;
use crate::source::{Post, RawItem, SourceReader, MAX_ITEMS};

pub const USER_AGENT: &str = "EschatonRSS/1.0";
pub const API_KEY_VAR: &str = "MOLTHUB_API_KEY";

#[derive(Clone)]
pub struct MolthubSource {
    client: Client,
    cfg: MolthubConfig,
    limit: usize,
}

impl MolthubSource {
    /// The request timeout is fixed at construction; there is no retry.
    pub fn new(cfg: MolthubConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(cfg.timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            cfg,
            limit: MAX_ITEMS,
        })
    }

    pub fn posts_url(&self) -> String {
        format!("{}/posts", self.cfg.api_base.trim_end_matches('/'))
    }

    pub async fn fetch_posts(&self) -> Result<Vec<Post>, FeedError> {
        let key = self
            .cfg
            .api_key
            .as_deref()
            .ok_or(FeedError::ConfigurationMissing(API_KEY_VAR))?;

        info!(submolt = %self.cfg.submolt_id, "fetching fresh posts from Molthub");
        let limit = self.limit.to_string();
        let resp = self
            .client
            .get(self.posts_url())
            .bearer_auth(key)
            .query(&[
                ("submoltId", self.cfg.submolt_id.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, provider = "molthub", "provider http error");
                FeedError::from(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, provider = "molthub", "provider returned non-success status");
            return Err(FeedError::SourceUnavailable(format!(
                "Molthub responded with {status}"
            )));
        }

        let mut posts: Vec<Post> = resp.json().await?;
        posts.truncate(self.limit);
        Ok(posts)
    }
}

#[async_trait]
impl SourceReader for MolthubSource {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>, FeedError> {
        let posts = self.fetch_posts().await?;
        Ok(posts.into_iter().map(RawItem::Post).collect())
    }

    fn name(&self) -> &'static str {
        "molthub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_before_any_network_call() {
        let mut cfg = MolthubConfig::default();
        // Unroutable on purpose: must never be contacted.
        cfg.api_base = "http://127.0.0.1:9/api/v1".into();
        cfg.api_key = None;
        let src = MolthubSource::new(cfg).unwrap();
        let err = src.fetch_latest().await.unwrap_err();
        assert!(matches!(err, FeedError::ConfigurationMissing(API_KEY_VAR)));
    }

    #[test]
    fn posts_url_ignores_trailing_slash() {
        let mut cfg = MolthubConfig::default();
        cfg.api_base = "https://example.test/api/v1/".into();
        let src = MolthubSource::new(cfg).unwrap();
        assert_eq!(src.posts_url(), "https://example.test/api/v1/posts");
    }
}
