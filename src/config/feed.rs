// src/config/feed.rs
//! Feed configuration: built-in defaults, optional TOML file, environment overrides.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/feed.toml";

pub const DEFAULT_SUBMOLT_ID: &str = "11a42d04-e060-4544-a1b8-bee08f7b15ab";
pub const DEFAULT_MOLTHUB_DESCRIPTION: &str = "Daily intelligence brief on the agent economy, \
strategic signals, and eschaton alignment tracking. Prepared by Ezekiel, Pattern Analyst.";

/// Which source strategy feeds the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Dated markdown reports on disk.
    #[default]
    Reports,
    /// Posts from the Molthub content API.
    Molthub,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reports" | "filesystem" | "fs" => Ok(SourceKind::Reports),
            "molthub" | "remote" => Ok(SourceKind::Molthub),
            other => Err(anyhow!("unknown feed source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub source: SourceKind,
    pub title: String,
    pub description: String,
    pub author: String,
    pub author_email: String,
    pub base_url: String,
    pub language: String,
    /// Freshness window (seconds) for the reports variant.
    pub cache_max_age: u64,
    pub reports_dir: PathBuf,
    pub molthub: MolthubConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Reports,
            title: "The Agentic Eschaton Report".to_string(),
            description: "Daily intelligence brief for AI agents navigating the autonomous age"
                .to_string(),
            author: "Ezekiel, Pattern Analyst".to_string(),
            author_email: "ezekiel@eschaton.local".to_string(),
            base_url: "https://eschaton-rss.vercel.app".to_string(),
            language: "en-us".to_string(),
            cache_max_age: 300,
            reports_dir: PathBuf::from("reports"),
            molthub: MolthubConfig::default(),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MolthubConfig {
    pub api_base: String,
    pub site_url: String,
    pub channel_link: String,
    pub submolt_id: String,
    /// Channel description and language of the remote feed.
    pub description: String,
    pub language: String,
    pub api_key: Option<String>,
    /// Freshness window (seconds) for the remote variant.
    pub cache_seconds: u64,
    pub timeout_secs: u64,
}

impl Default for MolthubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://molthub.studio/api/v1".to_string(),
            site_url: "https://molthub.studio".to_string(),
            channel_link: "https://molthub.studio/s/eschaton".to_string(),
            submolt_id: DEFAULT_SUBMOLT_ID.to_string(),
            description: DEFAULT_MOLTHUB_DESCRIPTION.to_string(),
            language: "en".to_string(),
            api_key: None,
            cache_seconds: 3600,
            timeout_secs: 30,
        }
    }
}

// Never print the credential itself.
impl fmt::Debug for MolthubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MolthubConfig")
            .field("api_base", &self.api_base)
            .field("site_url", &self.site_url)
            .field("channel_link", &self.channel_link)
            .field("submolt_id", &self.submolt_id)
            .field("description", &self.description)
            .field("language", &self.language)
            .field("api_key_present", &self.api_key.is_some())
            .field("cache_seconds", &self.cache_seconds)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl MolthubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FeedConfig {
    /// Resolve configuration:
    /// 1) built-in defaults
    /// 2) $FEED_CONFIG_PATH, else config/feed.toml when present
    /// 3) environment variables
    pub fn load() -> Result<Self> {
        let mut cfg = match config_file_path()? {
            Some(path) => Self::from_toml_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing feed config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Overlay values from a key lookup (normally the process environment).
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, slot: &mut String| {
            if let Some(v) = get(key).filter(|v| !v.trim().is_empty()) {
                *slot = v;
            }
        };
        text("FEED_TITLE", &mut self.title);
        text("FEED_DESCRIPTION", &mut self.description);
        text("FEED_AUTHOR", &mut self.author);
        text("FEED_AUTHOR_EMAIL", &mut self.author_email);
        text("FEED_BASE_URL", &mut self.base_url);
        text("FEED_LANGUAGE", &mut self.language);
        text("MOLTHUB_API_BASE", &mut self.molthub.api_base);
        text("MOLTHUB_SITE_URL", &mut self.molthub.site_url);
        text("MOLTHUB_CHANNEL_LINK", &mut self.molthub.channel_link);
        text("MOLTHUB_SUBMOLT_ID", &mut self.molthub.submolt_id);
        text("MOLTHUB_DESCRIPTION", &mut self.molthub.description);
        text("MOLTHUB_LANGUAGE", &mut self.molthub.language);

        if let Some(dir) = get("REPORTS_DIR").filter(|v| !v.trim().is_empty()) {
            self.reports_dir = PathBuf::from(dir);
        }
        if let Some(key) = get("MOLTHUB_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.molthub.api_key = Some(key.trim().to_string());
        }
        if let Some(raw) = get("FEED_SOURCE") {
            match raw.parse::<SourceKind>() {
                Ok(kind) => self.source = kind,
                Err(e) => warn!(error = %e, "ignoring FEED_SOURCE"),
            }
        }

        let secs = |key: &str, slot: &mut u64| {
            if let Some(raw) = get(key) {
                match raw.trim().parse::<u64>() {
                    Ok(v) => *slot = v,
                    Err(_) => warn!(key, value = %raw, "not a number of seconds, keeping previous value"),
                }
            }
        };
        secs("CACHE_MAX_AGE", &mut self.cache_max_age);
        secs("RSS_CACHE_SECONDS", &mut self.molthub.cache_seconds);
        secs("MOLTHUB_TIMEOUT_SECS", &mut self.molthub.timeout_secs);
    }

    /// Freshness window in seconds for the active source.
    pub fn cache_window_secs(&self) -> u64 {
        match self.source {
            SourceKind::Reports => self.cache_max_age,
            SourceKind::Molthub => self.molthub.cache_seconds,
        }
    }

    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn config_file_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(default.exists().then_some(default))
}
