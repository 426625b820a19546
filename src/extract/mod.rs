// src/extract/mod.rs
//! Projection of raw source content into RSS-ready items.
//!
//! Title and summary extraction for reports are pattern heuristics over free-form
//! markdown (first bold span, the "Executive Summary" section). They are best-effort.

pub mod markdown;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::source::{Post, RawItem, ReportFile};

pub use markdown::markdown_to_html;

pub const DESCRIPTION_CAP: usize = 500;
pub const BODY_CAP: usize = 3000;
pub const TRUNCATION_MARKER: &str = "...";

pub const SUMMARY_HEADING: &str = "## 🎯 Executive Summary";
pub const SUMMARY_FALLBACK: &str = "Daily intelligence brief from the agent economy frontlines.";
pub const TITLE_PREFIX: &str = "Eschaton Report: ";
pub const UNTITLED: &str = "Untitled";

pub const REPORT_CATEGORIES: [&str; 3] = ["Daily Brief", "Agent Economy", "Pattern Analysis"];
pub const DEFAULT_POST_CATEGORY: &str = "Intelligence";
pub const DEFAULT_POST_AUTHOR: &str = "ezekiel_prophet";

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));
static RE_LIST_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*- ").expect("dash regex"));
static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r?\n)+").expect("newline regex"));

/// RSS-ready projection of one raw item.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Always the permalink.
    pub guid: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub categories: Vec<String>,
    /// Plain text, at most `DESCRIPTION_CAP` chars plus the truncation marker.
    pub description: String,
    /// Extended HTML body (`content:encoded`), reports only.
    pub content_html: Option<String>,
    pub comments: Option<String>,
}

pub fn extract(raw: &RawItem, cfg: &FeedConfig, now: DateTime<Utc>) -> FeedItem {
    match raw {
        RawItem::Report(report) => from_report(report, cfg),
        RawItem::Post(post) => from_post(post, cfg, now),
    }
}

pub fn from_report(report: &ReportFile, cfg: &FeedConfig) -> FeedItem {
    let slug = report.date.format("%Y-%m-%d").to_string();
    let link = format!("{}/report/{slug}", cfg.base_url_trimmed());

    let html = markdown_to_html(head_chars(&report.body, BODY_CAP));
    let content_html = format!("{html}...<p><em>Full report available at {link}</em></p>");

    FeedItem {
        title: report_title(&report.body, report.date, &cfg.title),
        guid: link.clone(),
        link,
        pub_date: report_pub_date(report.date),
        author: format!("{} ({})", cfg.author_email, cfg.author),
        categories: REPORT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        description: executive_summary(&report.body),
        content_html: Some(content_html),
        comments: None,
    }
}

pub fn from_post(post: &Post, cfg: &FeedConfig, now: DateTime<Utc>) -> FeedItem {
    let site = cfg.molthub.site_url.trim_end_matches('/');
    let link = format!("{site}/p/{}", post.id);

    let pub_date = match post.created_at.as_deref().map(parse_created_at) {
        Some(Ok(dt)) => dt,
        Some(Err(e)) => {
            warn!(post = %post.id, error = %e, "unparseable createdAt, using now");
            now
        }
        None => now,
    };

    let author = post
        .author
        .as_ref()
        .and_then(|a| a.name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(DEFAULT_POST_AUTHOR);
    let category = post
        .submolt
        .as_ref()
        .and_then(|s| s.display_name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(DEFAULT_POST_CATEGORY);

    FeedItem {
        title: post
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        guid: link.clone(),
        comments: (post.comments() > 0).then(|| format!("{link}#comments")),
        link,
        pub_date,
        author: format!("{author}@{}", site_host(site)),
        categories: vec![category.to_string()],
        description: cap_description(post.content.as_deref().unwrap_or_default()),
        content_html: None,
    }
}

/// `"Eschaton Report: {span}"` from the first bold span of 11..=79 chars,
/// else `"{feed title} - {Month DD, YYYY}"`.
pub fn report_title(body: &str, date: NaiveDate, feed_title: &str) -> String {
    if let Some(caps) = RE_BOLD.captures(body) {
        let key = caps[1].trim();
        let len = key.chars().count();
        if len > 10 && len < 80 {
            return format!("{TITLE_PREFIX}{key}");
        }
    }
    format!("{feed_title} - {}", date.format("%B %d, %Y"))
}

/// Plain-text summary from the executive summary section, capped.
pub fn executive_summary(body: &str) -> String {
    let Some(start) = body.find(SUMMARY_HEADING) else {
        return SUMMARY_FALLBACK.to_string();
    };
    let rest = &body[start + SUMMARY_HEADING.len()..];
    let section = match rest.find("##") {
        Some(end) => &rest[..end],
        None => rest,
    };

    let cleaned = section.trim().replace("**", "");
    let cleaned = RE_LIST_DASH.replace_all(&cleaned, "");
    let cleaned = RE_NEWLINES.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return SUMMARY_FALLBACK.to_string();
    }
    cap_description(cleaned)
}

/// Cap at `DESCRIPTION_CAP` chars, appending the marker when cut.
pub fn cap_description(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_CAP {
        format!("{}{TRUNCATION_MARKER}", head_chars(text, DESCRIPTION_CAP))
    } else {
        text.to_string()
    }
}

/// Reports are published at 23:00 UTC on their date.
pub fn report_pub_date(date: NaiveDate) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(at).and_utc()
}

/// ISO-8601 with offset, or a naive timestamp taken as UTC.
pub fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, FeedError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| FeedError::MalformedInput(format!("createdAt {raw:?}: {e}")))
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn site_host(site: &str) -> &str {
    let no_scheme = site
        .strip_prefix("https://")
        .or_else(|| site.strip_prefix("http://"))
        .unwrap_or(site);
    no_scheme.split('/').next().unwrap_or(no_scheme)
}
