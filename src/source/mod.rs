// src/source/mod.rs
pub mod molthub;
pub mod reports;

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::FeedError;

/// Most items a single feed ever carries.
pub const MAX_ITEMS: usize = 30;

/// One unit of source content, read fresh on every generation pass.
#[derive(Debug, Clone)]
pub enum RawItem {
    Report(ReportFile),
    Post(Post),
}

#[derive(Debug, Clone)]
pub struct ReportFile {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub body: String,
}

/// A post record as returned by the Molthub API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author: Option<PostAuthor>,
    #[serde(default)]
    pub submolt: Option<Submolt>,
    #[serde(default)]
    pub comment_count: Option<u64>,
}

impl Post {
    pub fn comments(&self) -> u64 {
        self.comment_count.unwrap_or(0)
    }
}

/// Post ids arrive as strings, numbers or `null`.
fn lenient_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Id>::deserialize(de)? {
        Some(Id::Text(s)) => s,
        Some(Id::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PostAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Submolt {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[async_trait::async_trait]
pub trait SourceReader: Send + Sync {
    /// Newest-first, at most [`MAX_ITEMS`] entries.
    async fn fetch_latest(&self) -> Result<Vec<RawItem>, FeedError>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_tolerates_missing_and_null_fields() {
        let json = r#"[
            {"id":"abc","title":"Hello","content":"x","createdAt":"2026-01-01T00:00:00Z",
             "author":{"name":"ezekiel"},"submolt":{"displayName":"Eschaton"},"commentCount":3},
            {"id":"def","content":null}
        ]"#;
        let posts: Vec<Post> = serde_json::from_str(json).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].comments(), 3);
        assert_eq!(
            posts[0].submolt.as_ref().and_then(|s| s.display_name.as_deref()),
            Some("Eschaton")
        );
        assert_eq!(posts[1].title, None);
        assert_eq!(posts[1].content, None);
        assert_eq!(posts[1].comments(), 0);
    }

    #[test]
    fn numeric_or_null_ids_and_null_counts_do_not_reject_the_list() {
        let json = r#"[
            {"id":42,"title":"n","commentCount":null},
            {"id":null,"title":"z","commentCount":7},
            {"id":"s","title":"s"}
        ]"#;
        let posts: Vec<Post> = serde_json::from_str(json).unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].id, "42");
        assert_eq!(posts[0].comment_count, None);
        assert_eq!(posts[0].comments(), 0);
        assert_eq!(posts[1].id, "");
        assert_eq!(posts[1].comments(), 7);
        assert_eq!(posts[2].id, "s");
    }
}
