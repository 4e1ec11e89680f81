use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AccountHit, EnrichedArticle, Industry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryDigest {
    pub industry: Industry,
    pub articles: Vec<EnrichedArticle>,
}

/// Everything one run produced, in presentation order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    pub industries: Vec<IndustryDigest>,
    pub account_hits: Vec<AccountHit>,
}

impl Digest {
    /// Industry order and article order are kept as given; empty industries stay in.
    pub fn assemble(
        industries: Vec<IndustryDigest>,
        account_hits: Vec<AccountHit>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at,
            industries,
            account_hits,
        }
    }

    pub fn total_articles(&self) -> usize {
        self.industries.iter().map(|i| i.articles.len()).sum()
    }

    pub fn industry_count(&self) -> usize {
        self.industries.len()
    }

    /// Article URLs in page order, blanks skipped
    pub fn article_urls(&self) -> Vec<&str> {
        self.industries
            .iter()
            .flat_map(|i| i.articles.iter())
            .map(|a| a.article.url.as_str())
            .filter(|url| !url.is_empty())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::{Account, AccountAction, AccountKind, CandidateArticle};
    use chrono::TimeZone;

    pub fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    pub fn enriched(title: &str, url: &str) -> EnrichedArticle {
        let mut article = CandidateArticle::new(title, url);
        article.source_name = "Wire".to_string();
        article.published_at = "2026-10-15T08:00:00Z".to_string();
        EnrichedArticle {
            article,
            summary: format!("Summary of {}", title),
            agency_relevance: "Why it matters".to_string(),
            talking_points: vec!["One".to_string(), "Two".to_string(), "Three".to_string()],
        }
    }

    pub fn account_hit() -> AccountHit {
        AccountHit {
            account: Account::new("Acme", AccountKind::Prospect),
            article: CandidateArticle::new("Acme opens plant", "https://example.com/acme"),
            summary: "Acme opened a plant.".to_string(),
            strategic_angle: "Brand refresh time.".to_string(),
            action: AccountAction::OutreachEmail("Subject: Hello".to_string()),
        }
    }

    pub fn sample_digest() -> Digest {
        Digest::assemble(
            vec![
                IndustryDigest {
                    industry: Industry::new("Fintech", &["fintech"]),
                    articles: vec![
                        enriched("Bank launches app", "https://example.com/bank"),
                        enriched("Payments rail goes live", "https://example.com/rail"),
                    ],
                },
                IndustryDigest {
                    industry: Industry::new("Tourism", &["tourism"]),
                    articles: Vec::new(),
                },
            ],
            vec![account_hit()],
            generated_at(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_assemble_preserves_order_and_empty_industries() {
        let digest = sample_digest();
        let names: Vec<&str> = digest.industries.iter().map(|i| i.industry.name.as_str()).collect();
        assert_eq!(names, vec!["Fintech", "Tourism"]);
        assert!(digest.industries[1].articles.is_empty());
        assert_eq!(digest.industries[0].articles[1].article.title, "Payments rail goes live");
    }

    #[test]
    fn test_totals() {
        let digest = sample_digest();
        assert_eq!(digest.total_articles(), 2);
        assert_eq!(digest.industry_count(), 2);
        assert_eq!(digest.account_hits.len(), 1);
    }

    #[test]
    fn test_article_urls_in_order_skipping_blanks() {
        let mut digest = sample_digest();
        digest.industries[1].articles.push(enriched("No link", ""));
        assert_eq!(
            digest.article_urls(),
            vec!["https://example.com/bank", "https://example.com/rail"]
        );
    }
}
