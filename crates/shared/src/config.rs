use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dedupe::DEFAULT_OVERLAP_THRESHOLD;
use crate::llm::DEFAULT_MODEL;
use crate::models::{Account, Industry};

/// Credentials, read once per run from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub news_api_key: Option<String>,
    pub slack_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context(
                "ANTHROPIC_API_KEY not found.\n\n\
                To fix this, create ~/.config/industry-digest/.env with:\n  \
                ANTHROPIC_API_KEY=your_key_here\n  \
                NEWS_API_KEY=your_key_here\n  \
                SLACK_WEBHOOK_URL=https://hooks.slack.com/services/...\n\n\
                Get your Anthropic API key from: https://console.anthropic.com/settings/keys",
            )?;

        Ok(Self {
            anthropic_api_key,
            news_api_key: Self::optional_var("NEWS_API_KEY"),
            slack_webhook_url: Self::optional_var("SLACK_WEBHOOK_URL"),
        })
    }

    fn optional_var(name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/industry-digest/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("industry-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Who the digest is written for. Feeds the prompts and the page chrome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgencyProfile {
    pub name: String,
    pub digest_title: String,
    pub service_areas: Vec<String>,
}

impl Default for AgencyProfile {
    fn default() -> Self {
        Self {
            name: "Matic Digital".to_string(),
            digest_title: "Matic Digest".to_string(),
            service_areas: vec![
                "Brand & Creative: brand strategy & identity, content & messaging, brand systems & guidelines, rebranding & evolution, brand activation".to_string(),
                "Experience Design: personas & journey mapping, taxonomy & content strategy, design systems, UX/UI design, interaction & prototyping, user testing & validation".to_string(),
                "Software & Technology: website & software development, headless & monolithic CMS, platform modernization & integrations, full-stack engineering, security & compliance, ongoing support".to_string(),
                "Growth & Marketing Ops: market & audience intelligence, white space opportunity, go-to-market activation, SEO/GEO/AI visibility, content systems, lead generation & sales conversion, performance optimization".to_string(),
            ],
        }
    }
}

impl AgencyProfile {
    /// Numbered service list for prompts
    pub fn services_block(&self) -> String {
        self.service_areas
            .iter()
            .enumerate()
            .map(|(i, area)| format!("{}. {}", i + 1, area))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub page_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub remote: String,
    pub branch: String,
    pub deploy_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            page_url: None,
            output_dir: None,
            remote: "origin".to_string(),
            branch: "main".to_string(),
            deploy_timeout_secs: 300,
            poll_interval_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub dedupe: bool,
    pub track_accounts: bool,
    pub relative_dates: bool,
    pub dedupe_threshold: f64,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            dedupe: true,
            track_accounts: true,
            relative_dates: true,
            dedupe_threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

/// The digest definition file (config.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    pub articles_per_industry: usize,
    pub days_back: i64,
    pub industries: Vec<Industry>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub agency: AgencyProfile,
    #[serde(default)]
    pub publish: PublishSettings,
    #[serde(default)]
    pub features: FeatureFlags,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl DigestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Digest config not found: {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read digest config: {}", path.display()))?;

        let config = Self::from_json(&content)
            .with_context(|| format!("Invalid digest config: {}", path.display()))?;

        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: DigestConfig =
            serde_json::from_str(content).context("Failed to parse digest config JSON")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.industries.is_empty() {
            anyhow::bail!("Digest config must list at least one industry");
        }

        if self.days_back < 0 {
            anyhow::bail!("days_back must not be negative (got {})", self.days_back);
        }

        for industry in &self.industries {
            if industry.name.trim().is_empty() {
                anyhow::bail!("Every industry needs a name");
            }
            if industry.search_terms.is_empty() && industry.rss_feeds.is_empty() {
                anyhow::bail!(
                    "Industry {} has neither search terms nor RSS feeds",
                    industry.name
                );
            }
        }

        for account in &self.accounts {
            if account.name.trim().is_empty() {
                anyhow::bail!("Every account needs a name");
            }
        }

        if !(0.0..=1.0).contains(&self.features.dedupe_threshold) {
            anyhow::bail!(
                "dedupe_threshold must be between 0 and 1 (got {})",
                self.features.dedupe_threshold
            );
        }

        Ok(())
    }
}
