use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

/// Section blocks are capped at 3000 characters; stay under with some margin
pub const MAX_BLOCK_CHARS: usize = 2900;

/// Split text into chunks of at most `max_chars` characters.
///
/// When more text remains past the window, the chunk ends at the last newline
/// in the window, else the last space, else exactly at the limit. Leading
/// whitespace of the remainder is dropped.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];

        let mut chunk = window;
        if window_end < rest.len() {
            let cut = window.rfind('\n').or_else(|| window.rfind(' '));
            if let Some(cut) = cut.filter(|&c| c > 0) {
                chunk = &window[..cut];
            }
        }

        chunks.push(chunk.to_string());
        rest = rest[chunk.len()..].trim_start();
    }

    chunks
}

/// Block Kit payload: header, briefing sections, totals and a link button
pub fn build_payload(
    title: &str,
    date_str: &str,
    briefing: &str,
    total_articles: usize,
    industry_count: usize,
    page_url: &str,
) -> Value {
    let mut blocks = vec![json!({
        "type": "header",
        "text": {"type": "plain_text", "text": format!("{} · {}", title, date_str)}
    })];

    for chunk in split_message(briefing, MAX_BLOCK_CHARS) {
        blocks.push(json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": chunk}
        }));
    }

    blocks.push(json!({"type": "divider"}));
    blocks.push(json!({
        "type": "context",
        "elements": [{
            "type": "mrkdwn",
            "text": format!(
                "{} articles · {} industries · Internal use only",
                total_articles, industry_count
            )
        }]
    }));
    blocks.push(json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": {"type": "plain_text", "text": "Read Full Digest →"},
            "url": page_url,
            "style": "primary"
        }]
    }));

    json!({ "blocks": blocks })
}

pub struct SlackClient {
    client: Client,
    webhook_url: String,
}

impl SlackClient {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    pub async fn post(&self, payload: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .context("Failed to send Slack webhook request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Slack webhook returned error: {} - {}", status, error_text);
        }

        Ok(())
    }
}
