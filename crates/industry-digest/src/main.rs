use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shared::{
    write_outputs, ClaudeClient, Config, DigestConfig, DigestPipeline, DigestRenderer,
    LiveSources, PipelineOptions, Publisher, SlackClient,
};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "industry-digest")]
#[command(about = "Build the weekly industry news digest, publish it and post a Slack briefing")]
struct Args {
    /// Digest definition file (industries, accounts, publishing)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for the HTML output; must be a git checkout when publishing
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write the HTML only: no git push, deployment check or Slack post
    #[arg(long)]
    no_publish: bool,

    /// Classify every candidate, even near-duplicate headlines
    #[arg(long)]
    no_dedupe: bool,

    /// Skip the Account Watch section
    #[arg(long)]
    no_accounts: bool,

    /// Number of days to look back for articles
    #[arg(short, long)]
    days: Option<i64>,
}

/// CLI flag, then config file, then the directory holding the config file
fn resolve_output_dir(args: &Args, digest_config: &DigestConfig) -> PathBuf {
    if let Some(dir) = &args.output_dir {
        return dir.clone();
    }
    if let Some(dir) = &digest_config.publish.output_dir {
        return dir.clone();
    }
    args.config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let digest_config = DigestConfig::load(&args.config)?;

    let mut options = PipelineOptions::from_config(&digest_config);
    if args.no_dedupe {
        options.dedupe = false;
    }
    if args.no_accounts {
        options.track_accounts = false;
    }
    if let Some(days) = args.days {
        if days < 0 {
            anyhow::bail!("--days must not be negative (got {})", days);
        }
        options.lookback_days = days;
    }

    println!("🔍 Starting {}...", digest_config.agency.digest_title);
    println!(
        "  {} industries, {} articles each, last {} days",
        digest_config.industries.len(),
        options.target,
        options.lookback_days
    );

    let sources = LiveSources::new(config.news_api_key.clone())?;
    if !sources.has_newsapi() {
        warn!("NEWS_API_KEY not set, using RSS feeds only");
    }
    let model = ClaudeClient::new(config.anthropic_api_key.clone(), digest_config.model.clone())?;

    println!("\n📰 Collecting and evaluating articles...");
    let relative_dates = options.relative_dates;
    let pipeline = DigestPipeline::new(&sources, &model, &digest_config.agency, options);
    let now = Utc::now();
    let digest = pipeline
        .run(&digest_config.industries, &digest_config.accounts, now)
        .await;

    println!(
        "✓ Kept {} articles across {} industries",
        digest.total_articles(),
        digest.industry_count()
    );
    if !digest.account_hits.is_empty() {
        println!("✓ {} accounts in the news", digest.account_hits.len());
    }

    println!("\n📄 Building HTML digest...");
    let renderer = DigestRenderer::new(
        digest_config.agency.digest_title.clone(),
        digest_config.agency.name.clone(),
        relative_dates,
    );
    let html = renderer.generate(&digest);
    let output_dir = resolve_output_dir(&args, &digest_config);

    if args.no_publish {
        let files = write_outputs(&output_dir, &html, now)?;
        println!("\n✅ Digest saved to: {}", files.dated.display());
        return Ok(());
    }

    println!("\n📡 Publishing...");
    let slack = config
        .slack_webhook_url
        .clone()
        .map(SlackClient::new)
        .transpose()?;
    let publisher = Publisher::new(
        &digest_config.publish,
        &digest_config.agency,
        output_dir,
        &model,
        slack,
    );
    let report = publisher
        .publish(&digest, &html)
        .await
        .context("Failed to publish digest")?;

    println!(
        "\n✓ {} articles across {} industries.",
        digest.total_articles(),
        digest.industry_count()
    );
    if let Some(url) = &digest_config.publish.page_url {
        let status = if report.deployed { "Live at" } else { "Deploying to" };
        println!("🌐 {}: {}", status, url);
    }
    if report.posted {
        println!("💬 Briefing posted to Slack");
    }

    Ok(())
}
