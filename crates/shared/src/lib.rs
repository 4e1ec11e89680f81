// Public modules
pub mod accounts;
pub mod briefing;
pub mod classifier;
pub mod config;
pub mod dedupe;
pub mod digest;
pub mod feeds;
pub mod llm;
pub mod models;
pub mod newsapi;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod slack;
pub mod text;

// Re-export commonly used types
pub use accounts::AccountTracker;
pub use briefing::BriefingWriter;
pub use classifier::{ClassifierError, RelevanceClassifier, Verdict};
pub use config::{AgencyProfile, Config, DigestConfig, FeatureFlags, PublishSettings};
pub use dedupe::Deduplicator;
pub use digest::{Digest, IndustryDigest};
pub use feeds::FeedClient;
pub use llm::{ClaudeClient, LanguageModel};
pub use models::{
    Account, AccountAction, AccountHit, AccountKind, CandidateArticle, EnrichedArticle, Industry,
};
pub use newsapi::{NewsApiClient, NewsApiError};
pub use pipeline::{ArticleSource, DigestPipeline, LiveSources, PipelineOptions};
pub use publish::{write_outputs, PublishReport, Publisher};
pub use render::DigestRenderer;
pub use slack::SlackClient;
