// src/feed.rs
//! RSS 2.0 document assembly.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::{FeedConfig, SourceKind};
use crate::error::{render_failure, FeedError};
use crate::extract::FeedItem;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
pub const RSS_DOCS: &str = "https://www.rssboard.org/rss-specification";

pub const CHANNEL_CATEGORIES: [&str; 5] = [
    "AI Agents",
    "Artificial Intelligence",
    "Technology",
    "Intelligence",
    "Agent Economy",
];

pub const PLACEHOLDER_TITLE: &str = "Feed Initializing - Check Back Soon";
pub const PLACEHOLDER_DESCRIPTION: &str =
    "Reports are being generated. Please check back in a few hours.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelImage {
    pub url: String,
    pub title: String,
    pub link: String,
}

/// Feed-level metadata. Constant across requests; the build date is computed per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub description: String,
    pub link: String,
    pub language: String,
    pub generator: String,
    pub self_link: String,
    pub docs: Option<String>,
    pub managing_editor: Option<String>,
    pub web_master: Option<String>,
    pub ttl: Option<u32>,
    pub image: Option<ChannelImage>,
    pub categories: Vec<String>,
    /// Declare the `content:` namespace and emit `content:encoded`.
    pub extended_content: bool,
}

impl Channel {
    pub fn for_config(cfg: &FeedConfig) -> Self {
        let base = cfg.base_url_trimmed();
        let self_link = format!("{base}/api/feed");
        match cfg.source {
            SourceKind::Reports => Self {
                title: cfg.title.clone(),
                description: cfg.description.clone(),
                link: base.to_string(),
                language: cfg.language.clone(),
                generator: "Eschaton RSS Generator v2.0".to_string(),
                self_link,
                docs: Some(RSS_DOCS.to_string()),
                managing_editor: Some(cfg.author_email.clone()),
                web_master: Some(cfg.author_email.clone()),
                ttl: None,
                image: Some(ChannelImage {
                    url: format!("{base}/eschaton-icon.png"),
                    title: cfg.title.clone(),
                    link: base.to_string(),
                }),
                categories: CHANNEL_CATEGORIES.iter().map(|c| c.to_string()).collect(),
                extended_content: true,
            },
            SourceKind::Molthub => {
                let site = cfg.molthub.site_url.trim_end_matches('/');
                Self {
                    title: cfg.title.clone(),
                    description: cfg.molthub.description.clone(),
                    link: cfg.molthub.channel_link.clone(),
                    language: cfg.molthub.language.clone(),
                    generator: "EschatonRSS/1.0".to_string(),
                    self_link,
                    docs: None,
                    managing_editor: None,
                    web_master: None,
                    ttl: Some(60),
                    image: Some(ChannelImage {
                        url: format!("{site}/favicon.png"),
                        title: cfg.title.clone(),
                        link: cfg.molthub.channel_link.clone(),
                    }),
                    categories: Vec::new(),
                    extended_content: false,
                }
            }
        }
    }
}

/// Render a full document. Items are written in the order given; zero items
/// yields the placeholder document instead of an empty channel.
pub fn build_rss(
    channel: &Channel,
    items: &[FeedItem],
    now: DateTime<Utc>,
) -> Result<String, FeedError> {
    let Some(newest) = items.first() else {
        return build_placeholder(channel, now);
    };

    let mut w = RssWriter::begin(channel)?;
    w.channel_head(channel, newest.pub_date)?;
    w.channel_extras(channel)?;
    for item in items {
        w.item(item, channel.extended_content)?;
    }
    w.finish()
}

/// Minimal channel with a single explanatory item dated `now`.
pub fn build_placeholder(channel: &Channel, now: DateTime<Utc>) -> Result<String, FeedError> {
    let mut w = RssWriter::begin(channel)?;
    w.channel_head(channel, now)?;

    w.start("item")?;
    w.text("title", PLACEHOLDER_TITLE)?;
    w.text("description", PLACEHOLDER_DESCRIPTION)?;
    w.text("pubDate", &now.to_rfc2822())?;
    w.end("item")?;

    w.finish()
}

/// Characters allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Drop characters no XML 1.0 reader accepts, even escaped (control codes, U+FFFE/U+FFFF).
pub fn xml_chars(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

struct RssWriter {
    inner: Writer<Vec<u8>>,
}

impl RssWriter {
    fn begin(channel: &Channel) -> Result<Self, FeedError> {
        let mut inner = Writer::new_with_indent(Vec::new(), b' ', 2);
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(render_failure)?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:atom", ATOM_NS));
        if channel.extended_content {
            rss.push_attribute(("xmlns:content", CONTENT_NS));
        }
        inner
            .write_event(Event::Start(rss))
            .map_err(render_failure)?;

        let mut w = Self { inner };
        w.start("channel")?;
        Ok(w)
    }

    fn channel_head(&mut self, channel: &Channel, build_date: DateTime<Utc>) -> Result<(), FeedError> {
        self.text("title", &channel.title)?;
        self.text("description", &channel.description)?;
        self.text("link", &channel.link)?;
        self.text("language", &channel.language)?;
        self.text("lastBuildDate", &build_date.to_rfc2822())?;
        self.text("generator", &channel.generator)?;
        self.inner
            .create_element("atom:link")
            .with_attributes([
                ("href", channel.self_link.as_str()),
                ("rel", "self"),
                ("type", "application/rss+xml"),
            ])
            .write_empty()
            .map_err(render_failure)?;
        Ok(())
    }

    fn channel_extras(&mut self, channel: &Channel) -> Result<(), FeedError> {
        if let Some(docs) = &channel.docs {
            self.text("docs", docs)?;
        }
        if let Some(editor) = &channel.managing_editor {
            self.text("managingEditor", editor)?;
        }
        if let Some(master) = &channel.web_master {
            self.text("webMaster", master)?;
        }
        if let Some(ttl) = channel.ttl {
            self.text("ttl", &ttl.to_string())?;
        }
        if let Some(image) = &channel.image {
            self.start("image")?;
            self.text("url", &image.url)?;
            self.text("title", &image.title)?;
            self.text("link", &image.link)?;
            self.end("image")?;
        }
        for cat in &channel.categories {
            self.text("category", cat)?;
        }
        Ok(())
    }

    fn item(&mut self, item: &FeedItem, extended_content: bool) -> Result<(), FeedError> {
        self.start("item")?;
        self.text("title", &item.title)?;
        self.text("link", &item.link)?;
        self.inner
            .create_element("guid")
            .with_attribute(("isPermaLink", "true"))
            .write_text_content(BytesText::new(&xml_chars(&item.guid)))
            .map_err(render_failure)?;
        self.text("pubDate", &item.pub_date.to_rfc2822())?;
        self.text("author", &item.author)?;
        for cat in &item.categories {
            self.text("category", cat)?;
        }
        self.text("description", &item.description)?;
        if let Some(comments) = &item.comments {
            self.text("comments", comments)?;
        }
        if extended_content {
            if let Some(html) = &item.content_html {
                // A CDATA section cannot contain its own terminator.
                let safe = xml_chars(html).replace("]]>", "]]&gt;");
                self.inner
                    .create_element("content:encoded")
                    .write_cdata_content(BytesCData::new(safe.as_str()))
                    .map_err(render_failure)?;
            }
        }
        self.end("item")
    }

    fn text(&mut self, name: &str, value: &str) -> Result<(), FeedError> {
        self.inner
            .create_element(name)
            .write_text_content(BytesText::new(&xml_chars(value)))
            .map_err(render_failure)?;
        Ok(())
    }

    fn start(&mut self, name: &str) -> Result<(), FeedError> {
        self.inner
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(render_failure)
    }

    fn end(&mut self, name: &str) -> Result<(), FeedError> {
        self.inner
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(render_failure)
    }

    fn finish(mut self) -> Result<String, FeedError> {
        self.end("channel")?;
        self.end("rss")?;
        String::from_utf8(self.inner.into_inner()).map_err(render_failure)
    }
}
