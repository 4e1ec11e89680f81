use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::accounts::{build_account_query, AccountTracker};
use crate::classifier::RelevanceClassifier;
use crate::config::{AgencyProfile, DigestConfig};
use crate::dedupe::Deduplicator;
use crate::digest::{Digest, IndustryDigest};
use crate::feeds::FeedClient;
use crate::llm::LanguageModel;
use crate::models::{Account, AccountHit, CandidateArticle, Industry};
use crate::newsapi::{build_query, NewsApiClient, ACCOUNT_PAGE_SIZE, INDUSTRY_PAGE_SIZE};

/// Where candidates come from
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn search(
        &self,
        query: &str,
        now: DateTime<Utc>,
        days_back: i64,
        page_size: usize,
    ) -> Result<Vec<CandidateArticle>>;

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<CandidateArticle>>;
}

/// NewsAPI (when a key is configured) plus RSS/Atom feeds
pub struct LiveSources {
    newsapi: Option<NewsApiClient>,
    feeds: FeedClient,
}

impl LiveSources {
    pub fn new(news_api_key: Option<String>) -> Result<Self> {
        let newsapi = news_api_key.map(NewsApiClient::new).transpose()?;
        Ok(Self {
            newsapi,
            feeds: FeedClient::new()?,
        })
    }

    pub fn has_newsapi(&self) -> bool {
        self.newsapi.is_some()
    }
}

#[async_trait]
impl ArticleSource for LiveSources {
    async fn search(
        &self,
        query: &str,
        now: DateTime<Utc>,
        days_back: i64,
        page_size: usize,
    ) -> Result<Vec<CandidateArticle>> {
        match &self.newsapi {
            Some(client) => client.search_query(query, now, days_back, page_size).await,
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<CandidateArticle>> {
        self.feeds.fetch(feed_url).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub target: usize,
    pub lookback_days: i64,
    pub dedupe: bool,
    pub track_accounts: bool,
    pub relative_dates: bool,
    pub dedupe_threshold: f64,
}

impl PipelineOptions {
    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            target: config.articles_per_industry,
            lookback_days: config.days_back,
            dedupe: config.features.dedupe,
            track_accounts: config.features.track_accounts,
            relative_dates: config.features.relative_dates,
            dedupe_threshold: config.features.dedupe_threshold,
        }
    }
}

/// One run: industries in order, then accounts. One external call at a time.
pub struct DigestPipeline<'a, S: ArticleSource + ?Sized, M: LanguageModel + ?Sized> {
    sources: &'a S,
    classifier: RelevanceClassifier<'a, M>,
    tracker: AccountTracker<'a, M>,
    options: PipelineOptions,
}

impl<'a, S: ArticleSource + ?Sized, M: LanguageModel + ?Sized> DigestPipeline<'a, S, M> {
    pub fn new(
        sources: &'a S,
        model: &'a M,
        agency: &'a AgencyProfile,
        options: PipelineOptions,
    ) -> Self {
        Self {
            sources,
            classifier: RelevanceClassifier::new(model, agency),
            tracker: AccountTracker::new(model, agency),
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// NewsAPI results first, then each feed in order. A failing source contributes nothing.
    pub async fn gather_candidates(
        &self,
        industry: &Industry,
        now: DateTime<Utc>,
    ) -> Vec<CandidateArticle> {
        let mut candidates = Vec::new();

        if !industry.search_terms.is_empty() {
            let query = build_query(&industry.search_terms);
            match self
                .sources
                .search(&query, now, self.options.lookback_days, INDUSTRY_PAGE_SIZE)
                .await
            {
                Ok(articles) => {
                    debug!("{} candidates from NewsAPI", articles.len());
                    candidates.extend(articles);
                }
                Err(e) => warn!("NewsAPI fetch failed for {}: {:#}", industry.name, e),
            }
        }

        for feed_url in &industry.rss_feeds {
            match self.sources.fetch_feed(feed_url).await {
                Ok(articles) => {
                    info!("  + {} articles from RSS ({})", articles.len(), feed_url);
                    candidates.extend(articles);
                }
                Err(e) => warn!("Feed fetch failed for {}: {:#}", feed_url, e),
            }
        }

        candidates
    }

    pub async fn collect_industry(&self, industry: &Industry, now: DateTime<Utc>) -> IndustryDigest {
        info!("{}: fetching candidates", industry.name);
        let mut candidates = self.gather_candidates(industry, now).await;

        if self.options.dedupe {
            let before = candidates.len();
            candidates = Deduplicator::new(self.options.dedupe_threshold).dedupe(candidates);
            if candidates.len() < before {
                info!("  Removed {} near-duplicates", before - candidates.len());
            }
        }

        info!(
            "  {} candidates, evaluating relevance (target {})",
            candidates.len(),
            self.options.target
        );
        let articles = self
            .classifier
            .select_relevant(&industry.name, candidates, self.options.target)
            .await;
        info!("  → {} articles kept", articles.len());

        IndustryDigest {
            industry: industry.clone(),
            articles,
        }
    }

    /// At most one hit per account, in account order
    pub async fn collect_accounts(&self, accounts: &[Account], now: DateTime<Utc>) -> Vec<AccountHit> {
        let mut hits = Vec::new();

        for account in accounts {
            info!("Account {}: searching news", account.name);
            let query = build_account_query(account);
            let candidates = match self
                .sources
                .search(&query, now, self.options.lookback_days, ACCOUNT_PAGE_SIZE)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Account search failed for {}: {:#}", account.name, e);
                    continue;
                }
            };

            if let Some(hit) = self.tracker.find_hit(account, candidates).await {
                hits.push(hit);
            }
        }

        hits
    }

    pub async fn run(
        &self,
        industries: &[Industry],
        accounts: &[Account],
        now: DateTime<Utc>,
    ) -> Digest {
        let mut sections = Vec::with_capacity(industries.len());
        for industry in industries {
            sections.push(self.collect_industry(industry, now).await);
        }

        let hits = if self.options.track_accounts && !accounts.is_empty() {
            self.collect_accounts(accounts, now).await
        } else {
            Vec::new()
        };

        Digest::assemble(sections, hits, now)
    }
}
