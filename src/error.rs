// src/error.rs
//! Error kinds surfaced by the feed pipeline.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Remote fetch failed: network error, timeout, non-2xx status or undecodable body.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A required setting (e.g. the API credential) is absent.
    #[error("{0} not configured")]
    ConfigurationMissing(&'static str),

    /// Unparseable date or timestamp. Always recovered by the caller.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("render failure: {0}")]
    RenderFailure(String),
}

impl FeedError {
    /// Short, stable label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::SourceUnavailable(_) => "source_unavailable",
            FeedError::ConfigurationMissing(_) => "configuration_missing",
            FeedError::MalformedInput(_) => "malformed_input",
            FeedError::RenderFailure(_) => "render_failure",
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::SourceUnavailable(e.to_string())
    }
}

/// Adapter for `map_err` on XML writer results.
pub(crate) fn render_failure<E: std::fmt::Display>(e: E) -> FeedError {
    FeedError::RenderFailure(e.to_string())
}
