//! Generate the feed once from the current configuration and write it to a file.
//!
//! Usage: `render_feed [OUTPUT]` (defaults to `feed.xml`).

use anyhow::{Context, Result};
use eschaton_rss::{FeedConfig, FeedService};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    eschaton_rss::telemetry::init();

    let output = std::env::args().nth(1).unwrap_or_else(|| "feed.xml".to_string());

    let cfg = FeedConfig::load()?;
    println!("Generating RSS feed ({:?} source)...", cfg.source);
    let service = FeedService::from_config(cfg).context("building feed service")?;

    let xml = service.generate().await.context("generating feed")?;
    println!("   RSS size: {} bytes", xml.len());

    std::fs::write(&output, &xml).with_context(|| format!("writing {output}"))?;
    println!("Saved to: {output}");

    let preview: String = xml.chars().take(1000).collect();
    println!("\nPreview:\n{preview}...");
    Ok(())
}
