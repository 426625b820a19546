// src/source/reports.rs
//! Filesystem strategy: `daily-report-YYYY-MM-DD.md` files in one directory.

use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::source::{RawItem, ReportFile, SourceReader, MAX_ITEMS};

static RE_REPORT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^daily-report-(\d{4}-\d{2}-\d{2})\.md$").expect("report name regex"));

/// Parse the date embedded in a report file name.
pub fn parse_report_date(file_name: &str) -> Result<NaiveDate, FeedError> {
    let caps = RE_REPORT_NAME
        .captures(file_name)
        .ok_or_else(|| FeedError::MalformedInput(format!("not a report file name: {file_name}")))?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d")
        .map_err(|e| FeedError::MalformedInput(format!("{file_name}: {e}")))
}

pub fn is_report_name(file_name: &str) -> bool {
    RE_REPORT_NAME.is_match(file_name)
}

pub struct ReportsDir {
    dir: PathBuf,
    limit: usize,
}

impl ReportsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            limit: MAX_ITEMS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_ITEMS);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Matching report files, newest first. A missing directory yields nothing.
    pub async fn list(&self) -> Vec<(NaiveDate, PathBuf)> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "reports directory unreadable");
                return Vec::new();
            }
        };

        let mut reports = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "stopped listing reports");
                    break;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_report_name(name) {
                continue;
            }
            match parse_report_date(name) {
                Ok(date) => reports.push((date, entry.path())),
                Err(e) => {
                    warn!(error = %e, "skipping report with invalid date");
                    counter!("feed_source_skipped_total").increment(1);
                }
            }
        }

        reports.sort_by(|a, b| b.0.cmp(&a.0));
        reports
    }
}

#[async_trait]
impl SourceReader for ReportsDir {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>, FeedError> {
        let listed = self.list().await;
        debug!(count = listed.len(), dir = %self.dir.display(), "listed reports");

        let mut out = Vec::with_capacity(listed.len().min(self.limit));
        for (date, path) in listed.into_iter().take(self.limit) {
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => out.push(RawItem::Report(ReportFile { date, path, body })),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error reading report, skipped");
                    counter!("feed_source_skipped_total").increment(1);
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "reports"
    }
}
