//! RSS/Atom feed client
//!
//! Feed entries are mapped into the same candidate shape as NewsAPI results.
//! The entry summary doubles as description and content since feeds rarely
//! carry the article body.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use tracing::debug;

use crate::models::CandidateArticle;
use crate::text::strip_html;

pub const FEED_ENTRY_LIMIT: usize = 12;

pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (compatible; IndustryDigest/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, feed_url: &str) -> Result<Vec<CandidateArticle>> {
        let response = self
            .client
            .get(feed_url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", feed_url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Feed {} returned HTTP {}", feed_url, status);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read feed body")?;

        let articles = parse_feed(&bytes, feed_url, FEED_ENTRY_LIMIT)?;
        debug!("Parsed {} entries from {}", articles.len(), feed_url);
        Ok(articles)
    }
}

/// Parse RSS 2.0 first, then Atom
pub fn parse_feed(bytes: &[u8], feed_url: &str, limit: usize) -> Result<Vec<CandidateArticle>> {
    if let Ok(channel) = rss::Channel::read_from(bytes) {
        return Ok(from_rss_channel(&channel, feed_url, limit));
    }

    if let Ok(feed) = atom_syndication::Feed::read_from(bytes) {
        return Ok(from_atom_feed(&feed, feed_url, limit));
    }

    anyhow::bail!("Failed to parse feed as RSS or Atom: {}", feed_url)
}

fn from_rss_channel(channel: &rss::Channel, feed_url: &str, limit: usize) -> Vec<CandidateArticle> {
    let source = if channel.title().trim().is_empty() {
        feed_url.to_string()
    } else {
        channel.title().trim().to_string()
    };

    channel
        .items()
        .iter()
        .take(limit)
        .map(|item| {
            let summary = strip_html(item.description().unwrap_or_default());
            let image_url = media_content_url(item)
                .or_else(|| item.enclosure().map(|e| e.url().to_string()));

            CandidateArticle {
                title: item.title().unwrap_or_default().trim().to_string(),
                url: item.link().unwrap_or_default().trim().to_string(),
                description: summary.clone(),
                content: summary,
                source_name: source.clone(),
                image_url,
                published_at: item.pub_date().unwrap_or_default().to_string(),
            }
        })
        .collect()
}

/// First `media:content` url on the item, whatever its medium
fn media_content_url(item: &rss::Item) -> Option<String> {
    item.extensions()
        .get("media")?
        .get("content")?
        .iter()
        .find_map(|content| content.attrs().get("url").cloned())
}

fn from_atom_feed(feed: &atom_syndication::Feed, feed_url: &str, limit: usize) -> Vec<CandidateArticle> {
    let title = feed.title().to_string();
    let source = if title.trim().is_empty() {
        feed_url.to_string()
    } else {
        title.trim().to_string()
    };

    feed.entries()
        .iter()
        .take(limit)
        .map(|entry| {
            let summary_html = entry
                .summary()
                .map(|s| s.as_str())
                .or_else(|| entry.content().and_then(|c| c.value()))
                .unwrap_or_default();
            let summary = strip_html(summary_html);

            let url = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string())
                .unwrap_or_default();

            let image_url = entry
                .links()
                .iter()
                .find(|l| l.rel() == "enclosure")
                .map(|l| l.href().to_string());

            let published_at = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .with_timezone(&Utc)
                .to_rfc3339();

            CandidateArticle {
                title: entry.title().to_string().trim().to_string(),
                url,
                description: summary.clone(),
                content: summary,
                source_name: source.clone(),
                image_url,
                published_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Energy Weekly</title>
    <link>https://energy.example.com</link>
    <description>News</description>
    <item>
      <title>Grid storage doubles</title>
      <link>https://energy.example.com/grid</link>
      <description>&lt;p&gt;Batteries are &lt;b&gt;everywhere&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Thu, 15 Oct 2026 08:00:00 GMT</pubDate>
      <media:content url="https://energy.example.com/grid.jpg" medium="image"/>
      <enclosure url="https://energy.example.com/grid.mp3" length="1" type="audio/mpeg"/>
    </item>
    <item>
      <title>Offshore wind auction</title>
      <link>https://energy.example.com/wind</link>
      <description>Plain summary</description>
      <enclosure url="https://energy.example.com/wind.jpg" length="1" type="image/jpeg"/>
    </item>
    <item>
      <title>Third story</title>
      <link>https://energy.example.com/third</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Travel Desk</title>
  <id>urn:uuid:travel</id>
  <updated>2026-10-15T09:00:00Z</updated>
  <entry>
    <title>Lisbon caps cruise arrivals</title>
    <id>urn:uuid:1</id>
    <link rel="alternate" href="https://travel.example.com/lisbon"/>
    <link rel="enclosure" href="https://travel.example.com/lisbon.jpg"/>
    <updated>2026-10-15T09:00:00Z</updated>
    <summary>City council votes on new limits</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_maps_fields() {
        let articles = parse_feed(RSS.as_bytes(), "https://energy.example.com/feed", 12).unwrap();
        assert_eq!(articles.len(), 3);

        let first = &articles[0];
        assert_eq!(first.title, "Grid storage doubles");
        assert_eq!(first.url, "https://energy.example.com/grid");
        assert_eq!(first.source_name, "Energy Weekly");
        assert_eq!(first.published_at, "Thu, 15 Oct 2026 08:00:00 GMT");
        assert!(first.description.contains("Batteries"));
        assert!(!first.description.contains("<p>"));
        assert_eq!(first.description, first.content);
    }

    #[test]
    fn test_parse_rss_media_content_preferred_over_enclosure() {
        let articles = parse_feed(RSS.as_bytes(), "https://energy.example.com/feed", 12).unwrap();
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://energy.example.com/grid.jpg")
        );
        assert_eq!(
            articles[1].image_url.as_deref(),
            Some("https://energy.example.com/wind.jpg")
        );
        assert!(articles[2].image_url.is_none());
    }

    #[test]
    fn test_parse_rss_missing_fields_become_empty() {
        let articles = parse_feed(RSS.as_bytes(), "https://energy.example.com/feed", 12).unwrap();
        assert_eq!(articles[2].description, "");
        assert_eq!(articles[2].published_at, "");
    }

    #[test]
    fn test_parse_rss_respects_limit() {
        let articles = parse_feed(RSS.as_bytes(), "https://energy.example.com/feed", 2).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].title, "Offshore wind auction");
    }

    #[test]
    fn test_parse_rss_untitled_channel_uses_feed_url() {
        let xml = r#"<rss version="2.0"><channel><title></title><link>x</link><description>d</description>
            <item><title>Only item</title><link>https://a.example.com</link></item>
        </channel></rss>"#;
        let articles = parse_feed(xml.as_bytes(), "https://a.example.com/rss", 12).unwrap();
        assert_eq!(articles[0].source_name, "https://a.example.com/rss");
    }

    #[test]
    fn test_parse_atom_maps_fields() {
        let articles = parse_feed(ATOM.as_bytes(), "https://travel.example.com/atom", 12).unwrap();
        assert_eq!(articles.len(), 1);

        let entry = &articles[0];
        assert_eq!(entry.title, "Lisbon caps cruise arrivals");
        assert_eq!(entry.url, "https://travel.example.com/lisbon");
        assert_eq!(entry.source_name, "Travel Desk");
        assert_eq!(entry.description, "City council votes on new limits");
        assert_eq!(
            entry.image_url.as_deref(),
            Some("https://travel.example.com/lisbon.jpg")
        );
        assert!(entry.published_at.starts_with("2026-10-15T09:00:00"));
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_feed(b"not xml at all", "https://bad.example.com", 12).is_err());
    }
}
