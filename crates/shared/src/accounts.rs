use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::classifier::{extract_json, required, ClassifierError};
use crate::config::AgencyProfile;
use crate::llm::LanguageModel;
use crate::models::{Account, AccountAction, AccountHit, AccountKind, CandidateArticle};
use crate::newsapi::build_query;
use crate::text::truncate_chars;

const ACCOUNT_MAX_TOKENS: u32 = 900;

/// Name and aliases, quoted and OR-ed, for the NewsAPI `q` parameter
pub fn build_account_query(account: &Account) -> String {
    let mut terms = Vec::with_capacity(account.aliases.len() + 1);
    terms.push(account.name.as_str());
    for alias in &account.aliases {
        if !alias.trim().is_empty() && !terms.contains(&alias.as_str()) {
            terms.push(alias.as_str());
        }
    }
    build_query(&terms)
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountVerdict {
    About {
        summary: String,
        strategic_angle: String,
        action: AccountAction,
    },
    NotAbout,
}

#[derive(Deserialize)]
struct RawAccountVerdict {
    about_account: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    strategic_angle: Option<String>,
    #[serde(default)]
    outreach_email: Option<String>,
    #[serde(default)]
    relationship_note: Option<String>,
}

/// The action field required depends on whether the account is a prospect or a client
pub fn parse_account_verdict(text: &str, kind: AccountKind) -> Result<AccountVerdict, ClassifierError> {
    let raw: RawAccountVerdict = serde_json::from_str(extract_json(text)?)?;

    if !raw.about_account {
        return Ok(AccountVerdict::NotAbout);
    }

    let summary = required(raw.summary, "summary")?;
    let strategic_angle = required(raw.strategic_angle, "strategic_angle")?;
    let action = match kind {
        AccountKind::Prospect => {
            AccountAction::OutreachEmail(required(raw.outreach_email, "outreach_email")?)
        }
        AccountKind::Client => {
            AccountAction::RelationshipNote(required(raw.relationship_note, "relationship_note")?)
        }
    };

    Ok(AccountVerdict::About {
        summary,
        strategic_angle,
        action,
    })
}

pub fn build_account_prompt(
    account: &Account,
    article: &CandidateArticle,
    agency: &AgencyProfile,
) -> String {
    let aliases = if account.aliases.is_empty() {
        "none".to_string()
    } else {
        account.aliases.join(", ")
    };
    let context = account.context.as_deref().unwrap_or("none");

    let (relationship, action_field) = match account.kind {
        AccountKind::Prospect => (
            format!("{} is a prospect we would like to win.", account.name),
            r#""outreach_email": "A short, warm first-touch email (under 120 words) that references this news naturally. Subject line on the first line, then the body. No hard sell.""#,
        ),
        AccountKind::Client => (
            format!("{} is a current client.", account.name),
            r#""relationship_note": "2-3 sentences for the account lead: how to bring this up with the client and what it might mean for the work we do together.""#,
        ),
    };

    format!(
        r#"You are a senior strategist at {agency}, a full-service branding, design, and technology agency.

{agency}'s service areas:
{services}

{relationship}
Also known as: {aliases}
What we know: {context}

Is the article below genuinely about {name}? Passing mentions, lists of many companies, or a different company with a similar name do not count.

Article:
Title: {title}
Source: {source}
Description: {description}
Content: {content}

If it is genuinely about {name}, respond with ONLY this JSON (no other text):
{{
  "about_account": true,
  "summary": "2 sentences on what happened, plainly.",
  "strategic_angle": "2 sentences on what this opens up for {agency} with {name}.",
  {action_field}
}}

Otherwise respond with ONLY:
{{"about_account": false}}"#,
        agency = agency.name,
        services = agency.services_block(),
        relationship = relationship,
        aliases = aliases,
        context = context,
        name = account.name,
        title = article.title,
        source = article.source_name,
        description = truncate_chars(&article.description, 2_000),
        content = truncate_chars(&article.content, 4_000),
        action_field = action_field,
    )
}

/// Finds at most one news item per named account
pub struct AccountTracker<'a, M: LanguageModel + ?Sized> {
    model: &'a M,
    agency: &'a AgencyProfile,
}

impl<'a, M: LanguageModel + ?Sized> AccountTracker<'a, M> {
    pub fn new(model: &'a M, agency: &'a AgencyProfile) -> Self {
        Self { model, agency }
    }

    pub async fn evaluate(&self, account: &Account, article: &CandidateArticle) -> AccountVerdict {
        let prompt = build_account_prompt(account, article, self.agency);

        let reply = match self.model.complete(&prompt, ACCOUNT_MAX_TOKENS).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Account evaluation error for {}: {:#}", account.name, e);
                return AccountVerdict::NotAbout;
            }
        };

        match parse_account_verdict(&reply, account.kind) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!("Unusable account verdict for {}: {}", account.name, e);
                debug!("Raw reply: {}", reply);
                AccountVerdict::NotAbout
            }
        }
    }

    /// First candidate judged genuinely about the account wins; the rest are never evaluated
    pub async fn find_hit(
        &self,
        account: &Account,
        candidates: Vec<CandidateArticle>,
    ) -> Option<AccountHit> {
        for article in candidates {
            match self.evaluate(account, &article).await {
                AccountVerdict::About {
                    summary,
                    strategic_angle,
                    action,
                } => {
                    info!("  ✓ {}: {}", account.name, truncate_chars(&article.title, 60));
                    return Some(AccountHit {
                        account: account.clone(),
                        article,
                        summary,
                        strategic_angle,
                        action,
                    });
                }
                AccountVerdict::NotAbout => {
                    debug!("  ✗ {}: {}", account.name, truncate_chars(&article.title, 60));
                }
            }
        }

        info!("  No news about {}", account.name);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    const PROSPECT_HIT: &str = r#"{
        "about_account": true,
        "summary": "Acme opened a new plant.",
        "strategic_angle": "Their brand needs to catch up.",
        "outreach_email": "Subject: Congrats on the plant\n\nHi team..."
    }"#;

    const CLIENT_HIT: &str = r#"{
        "about_account": true,
        "summary": "Globex hired a new CMO.",
        "strategic_angle": "New CMOs revisit agencies.",
        "relationship_note": "Send a note before the first board meeting."
    }"#;

    const MISS: &str = r#"{"about_account": false}"#;

    fn prospect() -> Account {
        let mut account = Account::new("Acme", AccountKind::Prospect);
        account.aliases = vec!["Acme Corp".to_string(), "ACME".to_string()];
        account
    }

    fn candidates(n: usize) -> Vec<CandidateArticle> {
        (1..=n)
            .map(|i| CandidateArticle::new(format!("Item {}", i), format!("https://example.com/{}", i)))
            .collect()
    }

    #[test]
    fn test_build_account_query_includes_aliases() {
        assert_eq!(
            build_account_query(&prospect()),
            "\"Acme\" OR \"Acme Corp\" OR \"ACME\""
        );
    }

    #[test]
    fn test_build_account_query_skips_blank_and_repeated_aliases() {
        let mut account = Account::new("Globex", AccountKind::Client);
        account.aliases = vec!["".to_string(), "Globex".to_string()];
        assert_eq!(build_account_query(&account), "\"Globex\"");
    }

    #[test]
    fn test_parse_account_verdict_prospect_requires_email() {
        let verdict = parse_account_verdict(PROSPECT_HIT, AccountKind::Prospect).unwrap();
        match verdict {
            AccountVerdict::About { action, .. } => {
                assert!(matches!(action, AccountAction::OutreachEmail(ref e) if e.starts_with("Subject:")));
            }
            AccountVerdict::NotAbout => panic!("expected a hit"),
        }

        // A client reply has no email, so it cannot satisfy a prospect
        assert!(matches!(
            parse_account_verdict(CLIENT_HIT, AccountKind::Prospect),
            Err(ClassifierError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_account_verdict_client_note() {
        let verdict = parse_account_verdict(CLIENT_HIT, AccountKind::Client).unwrap();
        assert!(matches!(
            verdict,
            AccountVerdict::About { action: AccountAction::RelationshipNote(_), .. }
        ));
    }

    #[test]
    fn test_parse_account_verdict_miss() {
        assert_eq!(
            parse_account_verdict(MISS, AccountKind::Client).unwrap(),
            AccountVerdict::NotAbout
        );
    }

    #[test]
    fn test_account_prompt_branches_on_kind() {
        let article = CandidateArticle::new("Acme expands", "https://example.com");
        let prompt = build_account_prompt(&prospect(), &article, &AgencyProfile::default());
        assert!(prompt.contains("\"outreach_email\""));
        assert!(!prompt.contains("\"relationship_note\""));
        assert!(prompt.contains("Also known as: Acme Corp, ACME"));

        let client = Account::new("Globex", AccountKind::Client);
        let prompt = build_account_prompt(&client, &article, &AgencyProfile::default());
        assert!(prompt.contains("\"relationship_note\""));
        assert!(prompt.contains("Globex is a current client."));
    }

    #[tokio::test]
    async fn test_find_hit_first_relevant_wins() {
        let model = ScriptedModel::new([MISS, PROSPECT_HIT, PROSPECT_HIT]);
        let agency = AgencyProfile::default();
        let tracker = AccountTracker::new(&model, &agency);

        let hit = tracker.find_hit(&prospect(), candidates(3)).await.unwrap();

        assert_eq!(hit.article.title, "Item 2");
        assert_eq!(hit.account.name, "Acme");
        assert_eq!(hit.summary, "Acme opened a new plant.");
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_find_hit_none_when_nothing_matches() {
        let model = ScriptedModel::with_results(vec![
            Ok(MISS.to_string()),
            Err(anyhow::anyhow!("timeout")),
            Ok("garbage".to_string()),
        ]);
        let agency = AgencyProfile::default();
        let tracker = AccountTracker::new(&model, &agency);

        assert!(tracker.find_hit(&prospect(), candidates(3)).await.is_none());
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_find_hit_no_candidates() {
        let model = ScriptedModel::new(Vec::<String>::new());
        let agency = AgencyProfile::default();
        let tracker = AccountTracker::new(&model, &agency);

        assert!(tracker.find_hit(&prospect(), Vec::new()).await.is_none());
        assert_eq!(model.calls(), 0);
    }
}
