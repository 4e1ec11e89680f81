use chrono::Datelike;
use tracing::warn;

use crate::config::AgencyProfile;
use crate::digest::Digest;
use crate::llm::LanguageModel;

const BRIEFING_MAX_TOKENS: u32 = 1200;

const CTA_VARIANTS: [&str; 7] = [
    "The full breakdown is one click away: {url}",
    "Dig into the details in this week's full digest → {url}",
    "All {total} articles, fully briefed. Worth the scroll → {url}",
    "More signal, less noise. Full digest here: {url}",
    "Everything above, plus the details that didn't fit. {url}",
    "Pull up the full digest when you get a minute → {url}",
    "That's the week in preview. Full read here: {url}",
];

/// Closing line, rotated by day of year so consecutive runs vary
pub fn call_to_action(digest: &Digest, page_url: &str) -> String {
    let index = digest.generated_at.ordinal0() as usize % CTA_VARIANTS.len();
    CTA_VARIANTS[index]
        .replace("{url}", page_url)
        .replace("{total}", &digest.total_articles().to_string())
}

fn articles_block(digest: &Digest) -> String {
    let mut text = String::new();
    for section in &digest.industries {
        text.push_str(&format!("\n{}\n", section.industry.name.to_uppercase()));
        if section.articles.is_empty() {
            text.push_str("  (no relevant articles this week)\n");
        }
        for enriched in &section.articles {
            text.push_str(&format!(
                "  - {}: {}\n",
                enriched.article.title, enriched.summary
            ));
        }
    }
    text
}

pub fn build_briefing_prompt(
    digest: &Digest,
    agency: &AgencyProfile,
    page_url: &str,
    cta: &str,
) -> String {
    let emoji_map = digest
        .industries
        .iter()
        .map(|s| format!("  {}: {}", s.industry.name, s.industry.emoji()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are writing the weekly {title} briefing for Slack.

{agency} is a full-service branding, design, and technology agency with these service areas:
{services}

This briefing goes to the internal strategy team before their week starts. The full digest lives at {url}.

Write a Morning Brew-style executive briefing covering this week's industry news.
Tone: smart, conversational, a little sharp. Like a well-informed colleague catching you up before a Monday meeting. Not corporate. Not stiff.

FORMAT RULES:
- Open with a single punchy line that sets the tone for the week (no industry prefix, just a strong opener)
- Then one section per industry, structured exactly like this:

[emoji] *Industry Name*
• One sentence on the most interesting story, naturally connected to one of our service areas
• One sentence on another notable story or trend
• (add a third bullet only if there's a genuinely distinct third angle worth calling out)

Skip industries with no articles.

Use these emojis per industry:
{emoji_map}

- End with this exact line (do not change it): {cta}
- Use Slack markdown: *bold*, _italic_ where it adds punch
- Keep bullets tight: one sentence each, no padding
- Total length: readable in under 90 seconds

This week's articles:
{articles}"#,
        title = agency.digest_title,
        agency = agency.name,
        services = agency.services_block(),
        url = page_url,
        emoji_map = emoji_map,
        cta = cta,
        articles = articles_block(digest),
    )
}

/// Plain briefing built straight from the digest when the model is unavailable
pub fn fallback_briefing(digest: &Digest, agency: &AgencyProfile, cta: &str) -> String {
    let mut text = format!(
        "This week's {}: {} articles across {} industries.\n",
        agency.digest_title,
        digest.total_articles(),
        digest.industry_count()
    );

    for section in &digest.industries {
        if section.articles.is_empty() {
            continue;
        }
        text.push_str(&format!(
            "\n{} *{}*\n",
            section.industry.emoji(),
            section.industry.name
        ));
        for enriched in section.articles.iter().take(3) {
            text.push_str(&format!("• {}\n", enriched.article.title));
        }
    }

    if !digest.account_hits.is_empty() {
        let names: Vec<&str> = digest
            .account_hits
            .iter()
            .map(|h| h.account.name.as_str())
            .collect();
        text.push_str(&format!("\n👀 *Account Watch*: {}\n", names.join(", ")));
    }

    text.push_str(&format!("\n{}", cta));
    text
}

pub struct BriefingWriter<'a, M: LanguageModel + ?Sized> {
    model: &'a M,
    agency: &'a AgencyProfile,
}

impl<'a, M: LanguageModel + ?Sized> BriefingWriter<'a, M> {
    pub fn new(model: &'a M, agency: &'a AgencyProfile) -> Self {
        Self { model, agency }
    }

    /// Never fails: a model error or empty reply falls back to the plain briefing
    pub async fn generate(&self, digest: &Digest, page_url: &str) -> String {
        let cta = call_to_action(digest, page_url);
        let prompt = build_briefing_prompt(digest, self.agency, page_url, &cta);

        match self.model.complete(&prompt, BRIEFING_MAX_TOKENS).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Briefing came back empty, using fallback");
                fallback_briefing(digest, self.agency, &cta)
            }
            Err(e) => {
                warn!("Briefing generation failed, using fallback: {:#}", e);
                fallback_briefing(digest, self.agency, &cta)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::fixtures::sample_digest;
    use crate::llm::testing::ScriptedModel;
    use chrono::{TimeZone, Utc};

    const URL: &str = "https://example.github.io/digest/";

    // ==================== Call To Action Tests ====================

    #[test]
    fn test_call_to_action_rotates_by_day() {
        let mut digest = sample_digest();
        let first = call_to_action(&digest, URL);

        digest.generated_at = digest.generated_at + chrono::Duration::days(1);
        let next = call_to_action(&digest, URL);

        assert_ne!(first, next);
        assert!(first.contains(URL));
        assert!(next.contains(URL));
    }

    #[test]
    fn test_call_to_action_fills_total() {
        let mut digest = sample_digest();
        // Jan 3 is ordinal0 2, the variant with the article count
        digest.generated_at = Utc.with_ymd_and_hms(2026, 1, 3, 9, 0, 0).unwrap();
        assert_eq!(
            call_to_action(&digest, URL),
            format!("All 2 articles, fully briefed. Worth the scroll → {}", URL)
        );
    }

    // ==================== Prompt Tests ====================

    #[test]
    fn test_prompt_lists_articles_by_industry() {
        let digest = sample_digest();
        let prompt = build_briefing_prompt(&digest, &AgencyProfile::default(), URL, "CTA LINE");

        assert!(prompt.contains("weekly Matic Digest briefing"));
        assert!(prompt.contains("FINTECH\n  - Bank launches app: Summary of Bank launches app"));
        assert!(prompt.contains("TOURISM\n  (no relevant articles this week)"));
        assert!(prompt.contains("Fintech: 💳"));
        assert!(prompt.contains("do not change it): CTA LINE"));
    }

    // ==================== Generation Tests ====================

    #[tokio::test]
    async fn test_generate_returns_model_text() {
        let model = ScriptedModel::new(["☕ Big week.\n\n💳 *Fintech*\n• Banks ship apps."]);
        let agency = AgencyProfile::default();
        let writer = BriefingWriter::new(&model, &agency);

        let text = writer.generate(&sample_digest(), URL).await;

        assert!(text.starts_with("☕ Big week."));
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains(URL));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_error() {
        let model = ScriptedModel::with_results(vec![Err(anyhow::anyhow!("overloaded"))]);
        let agency = AgencyProfile::default();
        let writer = BriefingWriter::new(&model, &agency);
        let digest = sample_digest();

        let text = writer.generate(&digest, URL).await;

        assert!(text.contains("2 articles across 2 industries"));
        assert!(text.contains("💳 *Fintech*"));
        assert!(text.contains("• Bank launches app"));
        assert!(!text.contains("Tourism"));
        assert!(text.contains("*Account Watch*: Acme"));
        assert!(text.ends_with(&call_to_action(&digest, URL)));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_empty_reply() {
        let model = ScriptedModel::new(["   "]);
        let agency = AgencyProfile::default();
        let writer = BriefingWriter::new(&model, &agency);

        let text = writer.generate(&sample_digest(), URL).await;
        assert!(text.starts_with("This week's Matic Digest"));
    }
}
