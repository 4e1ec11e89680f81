use serde::{Deserialize, Serialize};

/// A raw fetched item, before any relevance judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateArticle {
    pub title: String,
    pub url: String,
    pub description: String,
    pub content: String,
    pub source_name: String,
    pub image_url: Option<String>,
    /// As reported by the source (RFC 3339 from NewsAPI, RFC 2822 from most RSS feeds)
    pub published_at: String,
}

impl CandidateArticle {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: String::new(),
            content: String::new(),
            source_name: String::new(),
            image_url: None,
            published_at: String::new(),
        }
    }
}

/// A candidate the classifier judged relevant, with its generated fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedArticle {
    pub article: CandidateArticle,
    pub summary: String,
    pub agency_relevance: String,
    pub talking_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Industry {
    pub name: String,
    #[serde(default)]
    pub search_terms: Vec<String>,
    #[serde(default)]
    pub rss_feeds: Vec<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl Industry {
    pub fn new(name: impl Into<String>, search_terms: &[&str]) -> Self {
        Self {
            name: name.into(),
            search_terms: search_terms.iter().map(|s| s.to_string()).collect(),
            rss_feeds: Vec::new(),
            accent_color: None,
            emoji: None,
        }
    }

    /// Accent color for the rendered section. Falls back to the house palette, then near-black.
    pub fn accent(&self) -> &str {
        if let Some(color) = self.accent_color.as_deref() {
            return color;
        }
        match self.name.as_str() {
            "Renewable Energy" => "#16a34a",
            "Health & Wellness" => "#2563eb",
            "Marketing Tech" => "#ea580c",
            "Tourism" => "#db2777",
            "Fintech" => "#7c3aed",
            "Artificial Intelligence" => "#0891b2",
            _ => "#111111",
        }
    }

    pub fn emoji(&self) -> &str {
        if let Some(emoji) = self.emoji.as_deref() {
            return emoji;
        }
        match self.name.as_str() {
            "Renewable Energy" => "⚡",
            "Health & Wellness" => "🩺",
            "Marketing Tech" => "🎯",
            "Tourism" => "✈️",
            "Fintech" => "💳",
            "Artificial Intelligence" => "🤖",
            _ => "📰",
        }
    }

    /// Fragment id used for in-page navigation
    pub fn anchor(&self) -> String {
        self.name.to_lowercase().replace(' ', "-").replace('&', "and")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Prospect,
    Client,
}

impl AccountKind {
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Prospect => "Prospect",
            AccountKind::Client => "Client",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[serde(default)]
    pub context: Option<String>,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            kind,
            context: None,
        }
    }
}

/// What the team should do about an account hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountAction {
    OutreachEmail(String),
    RelationshipNote(String),
}

impl AccountAction {
    pub fn label(&self) -> &'static str {
        match self {
            AccountAction::OutreachEmail(_) => "Outreach email draft",
            AccountAction::RelationshipNote(_) => "Relationship note",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            AccountAction::OutreachEmail(text) | AccountAction::RelationshipNote(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountHit {
    pub account: Account,
    pub article: CandidateArticle,
    pub summary: String,
    pub strategic_angle: String,
    pub action: AccountAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_replaces_spaces_and_ampersand() {
        let industry = Industry::new("Health & Wellness", &["telehealth"]);
        assert_eq!(industry.anchor(), "health-and-wellness");
    }

    #[test]
    fn test_accent_prefers_configured_color() {
        let mut industry = Industry::new("Fintech", &["payments"]);
        assert_eq!(industry.accent(), "#7c3aed");

        industry.accent_color = Some("#000000".to_string());
        assert_eq!(industry.accent(), "#000000");
    }

    #[test]
    fn test_accent_unknown_industry_falls_back() {
        let industry = Industry::new("Aerospace", &["rockets"]);
        assert_eq!(industry.accent(), "#111111");
        assert_eq!(industry.emoji(), "📰");
    }

    #[test]
    fn test_account_deserializes_type_field() {
        let account: Account =
            serde_json::from_str(r#"{"name": "Acme", "aliases": ["Acme Corp"], "type": "client"}"#)
                .unwrap();
        assert_eq!(account.kind, AccountKind::Client);
        assert_eq!(account.aliases, vec!["Acme Corp"]);
        assert!(account.context.is_none());
    }
}
