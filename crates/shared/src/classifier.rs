use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AgencyProfile;
use crate::llm::LanguageModel;
use crate::models::{CandidateArticle, EnrichedArticle};
use crate::text::truncate_chars;

const CLASSIFY_MAX_TOKENS: u32 = 600;
const TALKING_POINTS: usize = 3;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("reply contained no JSON object")]
    NoJson,

    #[error("reply JSON did not parse: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed verdict: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Relevant {
        summary: String,
        agency_relevance: String,
        talking_points: Vec<String>,
    },
    NotRelevant,
}

#[derive(Deserialize)]
struct RawVerdict {
    relevant: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    agency_relevance: Option<String>,
    #[serde(default)]
    talking_points: Option<Vec<String>>,
}

/// Slice from the first `{` to the last `}`
pub fn extract_json(text: &str) -> Result<&str, ClassifierError> {
    let start = text.find('{').ok_or(ClassifierError::NoJson)?;
    let end = text.rfind('}').ok_or(ClassifierError::NoJson)?;
    if end < start {
        return Err(ClassifierError::NoJson);
    }
    Ok(&text[start..=end])
}

pub(crate) fn required(field: Option<String>, name: &str) -> Result<String, ClassifierError> {
    match field.map(|s| s.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ClassifierError::Malformed(format!("missing {}", name))),
    }
}

pub fn parse_verdict(text: &str) -> Result<Verdict, ClassifierError> {
    let raw: RawVerdict = serde_json::from_str(extract_json(text)?)?;

    if !raw.relevant {
        return Ok(Verdict::NotRelevant);
    }

    let summary = required(raw.summary, "summary")?;
    let agency_relevance = required(raw.agency_relevance, "agency_relevance")?;

    let talking_points: Vec<String> = raw
        .talking_points
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if talking_points.len() != TALKING_POINTS {
        return Err(ClassifierError::Malformed(format!(
            "expected {} talking points, got {}",
            TALKING_POINTS,
            talking_points.len()
        )));
    }

    Ok(Verdict::Relevant {
        summary,
        agency_relevance,
        talking_points,
    })
}

pub fn build_prompt(article: &CandidateArticle, industry_name: &str, agency: &AgencyProfile) -> String {
    format!(
        r#"You are a senior strategist at {agency}, a full-service branding, design, and technology agency.
You work with clients in the {industry} space.

{agency}'s service areas:
{services}

Evaluate this article. Is it genuinely relevant to the {industry} industry?

RELEVANT = meaningful news, trends, innovation, regulation, market shifts, or business developments in {industry}.
NOT RELEVANT = tangentially related, off-topic, political news unrelated to the industry, too generic, or clickbait.

Article:
Title: {title}
Source: {source}
Description: {description}
Content: {content}

If relevant, respond with ONLY this JSON (no other text):
{{
  "relevant": true,
  "summary": "2-3 sentences. Write like a smart colleague telling you what they just read. Direct, clear, no fluff. Active voice. Say what happened and why it matters.",
  "agency_relevance": "2-3 sentences. What does this signal for {industry} clients specifically? Name which of {agency}'s service areas are most relevant and say plainly why.",
  "talking_points": [
    "A natural conversation starter with a client in this space. Curious, not salesy.",
    "A specific service opportunity this news surfaces, framed as a question or observation, not a pitch.",
    "A forward-looking provocation that makes a client pause and think differently about where they're headed."
  ]
}}

Tone guide:
- Confident, human, a little sharp.
- Short sentences. No hedging. No padding.
- Never use: leverage, solutions, deliverables, synergy, holistic, utilize, impactful.
- Talking points should sound like things a person would actually say, not bullets from a deck.

If NOT relevant, respond with ONLY:
{{"relevant": false}}"#,
        agency = agency.name,
        industry = industry_name,
        services = agency.services_block(),
        title = article.title,
        source = article.source_name,
        description = truncate_chars(&article.description, 2_000),
        content = truncate_chars(&article.content, 4_000),
    )
}

/// Judges one article at a time against one industry
pub struct RelevanceClassifier<'a, M: LanguageModel + ?Sized> {
    model: &'a M,
    agency: &'a AgencyProfile,
}

impl<'a, M: LanguageModel + ?Sized> RelevanceClassifier<'a, M> {
    pub fn new(model: &'a M, agency: &'a AgencyProfile) -> Self {
        Self { model, agency }
    }

    /// Model failures and unusable replies both count as not relevant
    pub async fn evaluate(&self, article: &CandidateArticle, industry_name: &str) -> Verdict {
        let prompt = build_prompt(article, industry_name, self.agency);

        let reply = match self.model.complete(&prompt, CLASSIFY_MAX_TOKENS).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Evaluation error for {:?}: {:#}", article.title, e);
                return Verdict::NotRelevant;
            }
        };

        match parse_verdict(&reply) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Unusable verdict for {:?}: {}", article.title, e);
                debug!("Raw reply: {}", reply);
                Verdict::NotRelevant
            }
        }
    }

    /// Classify in order until `target` articles are kept. Later candidates are never evaluated.
    pub async fn select_relevant(
        &self,
        industry_name: &str,
        candidates: Vec<CandidateArticle>,
        target: usize,
    ) -> Vec<EnrichedArticle> {
        let mut kept = Vec::with_capacity(target);

        for article in candidates {
            if kept.len() >= target {
                break;
            }

            match self.evaluate(&article, industry_name).await {
                Verdict::Relevant {
                    summary,
                    agency_relevance,
                    talking_points,
                } => {
                    info!("  ✓ {}", truncate_chars(&article.title, 65));
                    kept.push(EnrichedArticle {
                        article,
                        summary,
                        agency_relevance,
                        talking_points,
                    });
                }
                Verdict::NotRelevant => {
                    info!("  ✗ Skipped: {}", truncate_chars(&article.title, 60));
                }
            }
        }

        kept
    }
}
