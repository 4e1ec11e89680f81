use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::models::CandidateArticle;

pub const INDUSTRY_PAGE_SIZE: usize = 12;
pub const ACCOUNT_PAGE_SIZE: usize = 5;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";

#[derive(Debug, Error)]
pub enum NewsApiError {
    #[error("NewsAPI returned status {status:?}: {message}")]
    Api { status: String, message: String },

    #[error("Failed to parse NewsAPI response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    articles: Vec<RawArticle>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    url_to_image: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

impl From<RawArticle> for CandidateArticle {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw.title.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            content: raw.content.unwrap_or_default(),
            source_name: raw.source.and_then(|s| s.name).unwrap_or_default(),
            image_url: raw.url_to_image.filter(|u| !u.is_empty()),
            published_at: raw.published_at.unwrap_or_default(),
        }
    }
}

/// Query string for the `q` parameter: every term quoted, OR-ed together
pub fn build_query<S: AsRef<str>>(terms: &[S]) -> String {
    terms
        .iter()
        .map(|term| format!("\"{}\"", term.as_ref()))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub fn parse_response(body: &str) -> Result<Vec<CandidateArticle>, NewsApiError> {
    let response: EverythingResponse = serde_json::from_str(body)?;

    if response.status != "ok" {
        return Err(NewsApiError::Api {
            status: response.status,
            message: response.message.unwrap_or_else(|| "no message".to_string()),
        });
    }

    Ok(response.articles.into_iter().map(CandidateArticle::from).collect())
}

pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn everything_url(
        &self,
        query: &str,
        since: DateTime<Utc>,
        page_size: usize,
    ) -> Result<Url> {
        let from = since.format("%Y-%m-%d").to_string();
        let page_size = page_size.to_string();
        Url::parse_with_params(
            &format!("{}/v2/everything", self.base_url),
            &[
                ("q", query),
                ("from", from.as_str()),
                ("sortBy", "relevancy"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .context("Failed to build NewsAPI URL")
    }

    /// Articles matching any of `terms`, published within `days_back` days of `now`
    pub async fn search(
        &self,
        terms: &[String],
        now: DateTime<Utc>,
        days_back: i64,
        page_size: usize,
    ) -> Result<Vec<CandidateArticle>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        self.search_query(&build_query(terms), now, days_back, page_size)
            .await
    }

    /// Run an already-built `q` expression
    pub async fn search_query(
        &self,
        query: &str,
        now: DateTime<Utc>,
        days_back: i64,
        page_size: usize,
    ) -> Result<Vec<CandidateArticle>> {
        let url = self.everything_url(query, now - Duration::days(days_back), page_size)?;

        let response = self
            .client
            .get(url)
            .header("User-Agent", "industry-digest/0.1")
            .send()
            .await
            .context("Failed to send request to NewsAPI")?;

        // Error payloads carry a useful message even on non-2xx statuses
        let body = response
            .text()
            .await
            .context("Failed to read NewsAPI response body")?;

        Ok(parse_response(&body)?)
    }
}
