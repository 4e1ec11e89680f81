use chrono::{DateTime, Utc};

use crate::digest::{Digest, IndustryDigest};
use crate::models::{AccountHit, EnrichedArticle};
use crate::text::{format_absolute, format_relative};

pub struct DigestRenderer {
    digest_title: String,
    agency_name: String,
    relative_dates: bool,
}

impl DigestRenderer {
    pub fn new(digest_title: impl Into<String>, agency_name: impl Into<String>, relative_dates: bool) -> Self {
        Self {
            digest_title: digest_title.into(),
            agency_name: agency_name.into(),
            relative_dates,
        }
    }

    /// Long date shown on the page, e.g. "October 6, 2026". The deployment poll looks for it.
    pub fn display_date(date: DateTime<Utc>) -> String {
        date.format("%B %-d, %Y").to_string()
    }

    fn format_date(&self, published: &str, now: DateTime<Utc>) -> String {
        if self.relative_dates {
            format_relative(published, now)
        } else {
            format_absolute(published)
        }
    }

    pub fn generate(&self, digest: &Digest) -> String {
        let mut html = String::new();
        let date = digest.generated_at;
        let date_str = Self::display_date(date);
        let title = Self::escape_html(&self.digest_title);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        html.push_str(&format!("  <title>{} - {}</title>\n", title, date_str));
        html.push_str("  <style>\n");
        html.push_str("    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }\n");
        html.push_str("    :root { --bg: #F3F2EF; --surface: #ffffff; --ink: #0f0f0f; --ink-2: rgba(15,15,15,0.6); --ink-3: rgba(15,15,15,0.35); --rule: #E0DDD8; }\n");
        html.push_str("    html { scroll-behavior: smooth; }\n");
        html.push_str("    body { font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif; background: var(--bg); color: var(--ink); line-height: 1.6; }\n");
        html.push_str("    .site-header { background: var(--ink); padding: 40px 56px; display: flex; align-items: flex-end; justify-content: space-between; gap: 48px; }\n");
        html.push_str("    .brand h1 { font-size: 15px; font-weight: 600; color: #fff; }\n");
        html.push_str("    .brand p { font-size: 11px; color: rgba(255,255,255,0.3); margin-top: 4px; }\n");
        html.push_str("    .header-stats { display: flex; gap: 40px; align-items: flex-end; }\n");
        html.push_str("    .stat { text-align: right; }\n");
        html.push_str("    .stat-value { font-size: 36px; font-weight: 300; color: #fff; line-height: 1; }\n");
        html.push_str("    .stat-label { font-size: 9px; color: rgba(255,255,255,0.3); text-transform: uppercase; letter-spacing: 1.2px; margin-top: 5px; }\n");
        html.push_str("    .site-nav { position: sticky; top: 0; z-index: 100; background: var(--surface); border-bottom: 1px solid var(--rule); padding: 0 56px; display: flex; overflow-x: auto; }\n");
        html.push_str("    .site-nav a { display: flex; align-items: center; padding: 0 16px; height: 48px; font-size: 10px; font-weight: 600; color: var(--ink-3); text-decoration: none; text-transform: uppercase; letter-spacing: 0.8px; }\n");
        html.push_str("    .site-nav a:hover { color: var(--ink); }\n");
        html.push_str("    .nav-action { margin-left: auto; display: flex; align-items: center; padding-left: 32px; }\n");
        html.push_str("    .copy-btn { background: var(--ink); color: #fff; border: none; cursor: pointer; padding: 9px 18px; font-size: 10px; font-weight: 600; text-transform: uppercase; }\n");
        html.push_str("    main { max-width: 1440px; margin: 0 auto; padding: 72px 56px 96px; }\n");
        html.push_str("    section { margin-bottom: 96px; }\n");
        html.push_str("    .section-header { display: flex; align-items: baseline; justify-content: space-between; border-top: 3px solid var(--accent, #111); padding-top: 22px; margin-bottom: 32px; }\n");
        html.push_str("    .section-title { font-size: 32px; font-weight: 700; display: flex; align-items: baseline; gap: 14px; }\n");
        html.push_str("    .section-num { font-size: 14px; font-weight: 400; color: var(--accent, rgba(15,15,15,0.3)); }\n");
        html.push_str("    .section-meta { font-size: 11px; color: var(--ink-3); }\n");
        html.push_str("    .grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; align-items: start; }\n");
        html.push_str("    .card { background: var(--surface); border-radius: 3px; overflow: hidden; display: flex; flex-direction: column; box-shadow: 0 1px 2px rgba(0,0,0,.06), 0 0 0 1px rgba(0,0,0,.05); }\n");
        html.push_str("    .card-img { width: 100%; height: 160px; object-fit: cover; display: block; }\n");
        html.push_str("    .card-img-accent { height: 4px; width: 100%; }\n");
        html.push_str("    .card-body { padding: 22px; display: flex; flex-direction: column; gap: 14px; }\n");
        html.push_str("    .source { font-size: 9px; font-weight: 600; text-transform: uppercase; letter-spacing: 1.2px; color: var(--ink-3); }\n");
        html.push_str("    .headline { font-size: 15px; font-weight: 600; line-height: 1.4; }\n");
        html.push_str("    .summary, .meta-text { font-size: 13px; line-height: 1.7; color: var(--ink-2); }\n");
        html.push_str("    .meta-block { background: rgba(0,0,0,.02); border-left: 2px solid var(--accent, #ddd); padding: 13px 15px; }\n");
        html.push_str("    .meta-label { font-size: 8px; font-weight: 700; text-transform: uppercase; letter-spacing: 1.4px; color: var(--accent, #999); margin-bottom: 7px; }\n");
        html.push_str("    .talking-points { list-style: none; display: flex; flex-direction: column; gap: 8px; font-size: 12px; color: var(--ink-2); }\n");
        html.push_str("    .read-more { font-size: 10px; font-weight: 600; color: var(--ink); text-decoration: none; text-transform: uppercase; }\n");
        html.push_str("    .empty { font-size: 13px; color: var(--ink-3); font-style: italic; }\n");
        html.push_str("    .badge { display: inline-block; font-size: 9px; font-weight: 700; text-transform: uppercase; padding: 2px 6px; border: 1px solid var(--ink-3); margin-left: 8px; }\n");
        html.push_str("    .draft { white-space: pre-wrap; font-family: inherit; font-size: 12px; color: var(--ink-2); }\n");
        html.push_str("    .site-footer { border-top: 1px solid var(--rule); padding: 32px 56px; display: flex; justify-content: space-between; background: var(--surface); font-size: 11px; }\n");
        html.push_str("    @media (max-width: 1024px) { .grid { grid-template-columns: repeat(2, 1fr); } main { padding: 56px 32px 72px; } }\n");
        html.push_str("    @media (max-width: 640px) { .grid { grid-template-columns: 1fr; } .site-header { flex-direction: column; align-items: flex-start; padding: 24px 20px; } main { padding: 36px 20px 56px; } }\n");
        html.push_str("  </style>\n");
        html.push_str("</head>\n<body>\n");

        // Header with stats
        html.push_str("<header class=\"site-header\">\n");
        html.push_str(&format!(
            "  <div class=\"brand\"><h1>{}</h1><p>Industry Intelligence · Internal</p></div>\n",
            title
        ));
        html.push_str("  <div class=\"header-stats\">\n");
        html.push_str(&Self::stat(&digest.total_articles().to_string(), "Articles"));
        html.push_str(&Self::stat(&digest.industry_count().to_string(), "Industries"));
        if !digest.account_hits.is_empty() {
            html.push_str(&Self::stat(&digest.account_hits.len().to_string(), "Accounts"));
        }
        html.push_str(&Self::stat(
            &date.format("%b %d").to_string(),
            &date.format("%Y").to_string(),
        ));
        html.push_str("  </div>\n</header>\n");

        // Navigation
        html.push_str("<nav class=\"site-nav\">\n  <div class=\"nav-links\">\n");
        for section in &digest.industries {
            html.push_str(&format!(
                "    <a href=\"#{}\">{}</a>\n",
                section.industry.anchor(),
                Self::escape_html(&section.industry.name)
            ));
        }
        if !digest.account_hits.is_empty() {
            html.push_str("    <a href=\"#account-watch\">Account Watch</a>\n");
        }
        html.push_str("  </div>\n");
        html.push_str("  <div class=\"nav-action\"><button class=\"copy-btn\" onclick=\"copyURLs(this)\">Copy URLs</button></div>\n");
        html.push_str("</nav>\n");

        html.push_str("<main>\n");
        for (index, section) in digest.industries.iter().enumerate() {
            self.push_industry(&mut html, index, section, date);
        }
        if !digest.account_hits.is_empty() {
            self.push_account_watch(&mut html, &digest.account_hits, date);
        }
        html.push_str("</main>\n");

        html.push_str("<footer class=\"site-footer\">\n");
        html.push_str(&format!(
            "  <div class=\"footer-logo\">{}</div>\n",
            Self::escape_html(&self.agency_name)
        ));
        html.push_str(&format!(
            "  <div class=\"footer-meta\">Industry Digest · {} · Internal Use Only</div>\n",
            date_str
        ));
        html.push_str("</footer>\n");

        // URL list for the copy button; JSON string escaping keeps it inert inside <script>
        let urls_json = serde_json::to_string(&digest.article_urls())
            .unwrap_or_else(|_| "[]".to_string())
            .replace("</", "<\\/");
        html.push_str("<script>\n");
        html.push_str("  function copyURLs(btn) {\n");
        html.push_str(&format!("    const urls = {};\n", urls_json));
        html.push_str("    navigator.clipboard.writeText(urls.join(\"\\n\")).then(() => {\n");
        html.push_str("      const orig = btn.textContent;\n");
        html.push_str("      btn.textContent = \"Copied\";\n");
        html.push_str("      setTimeout(() => btn.textContent = orig, 2500);\n");
        html.push_str("    });\n");
        html.push_str("  }\n");
        html.push_str("</script>\n");

        html.push_str("</body>\n</html>");
        html
    }

    fn stat(value: &str, label: &str) -> String {
        format!(
            "    <div class=\"stat\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>\n",
            Self::escape_html(value),
            Self::escape_html(label)
        )
    }

    fn push_industry(&self, html: &mut String, index: usize, section: &IndustryDigest, now: DateTime<Utc>) {
        let accent = Self::escape_html(section.industry.accent());

        html.push_str(&format!(
            "<section id=\"{}\" style=\"--accent:{};\">\n",
            section.industry.anchor(),
            accent
        ));
        html.push_str("  <div class=\"section-header\">\n");
        html.push_str(&format!(
            "    <div class=\"section-title\"><span class=\"section-num\">{:02}</span>{}</div>\n",
            index + 1,
            Self::escape_html(&section.industry.name)
        ));
        let count = section.articles.len();
        html.push_str(&format!(
            "    <div class=\"section-meta\">{} {} this week</div>\n",
            count,
            if count == 1 { "article" } else { "articles" }
        ));
        html.push_str("  </div>\n");

        if section.articles.is_empty() {
            html.push_str("  <p class=\"empty\">No relevant articles this week.</p>\n");
        } else {
            html.push_str("  <div class=\"grid\">\n");
            for article in &section.articles {
                self.push_card(html, article, &accent, now);
            }
            html.push_str("  </div>\n");
        }

        html.push_str("</section>\n");
    }

    fn push_card(&self, html: &mut String, enriched: &EnrichedArticle, accent: &str, now: DateTime<Utc>) {
        let article = &enriched.article;

        html.push_str("    <div class=\"card\">\n");
        match &article.image_url {
            Some(image) => html.push_str(&format!(
                "      <img class=\"card-img\" src=\"{}\" alt=\"\" onerror=\"this.style.display='none'\">\n",
                Self::escape_html(image)
            )),
            None => html.push_str(&format!(
                "      <div class=\"card-img-accent\" style=\"background:{};\"></div>\n",
                accent
            )),
        }
        html.push_str("      <div class=\"card-body\">\n");

        let date = self.format_date(&article.published_at, now);
        let source_line = if date.is_empty() {
            Self::escape_html(&article.source_name)
        } else {
            format!(
                "{} · {}",
                Self::escape_html(&article.source_name),
                Self::escape_html(&date)
            )
        };
        html.push_str(&format!("        <div class=\"source\">{}</div>\n", source_line));
        html.push_str(&format!(
            "        <div class=\"headline\">{}</div>\n",
            Self::escape_html(&article.title)
        ));
        html.push_str(&format!(
            "        <div class=\"summary\">{}</div>\n",
            Self::escape_html(&enriched.summary)
        ));

        html.push_str("        <div class=\"meta-block\">\n");
        html.push_str("          <div class=\"meta-label\">Why it matters</div>\n");
        html.push_str(&format!(
            "          <div class=\"meta-text\">{}</div>\n",
            Self::escape_html(&enriched.agency_relevance)
        ));
        html.push_str("        </div>\n");

        html.push_str("        <div class=\"meta-block\">\n");
        html.push_str("          <div class=\"meta-label\">Talking points</div>\n");
        html.push_str("          <ul class=\"talking-points\">\n");
        for point in &enriched.talking_points {
            html.push_str(&format!("            <li>{}</li>\n", Self::escape_html(point)));
        }
        html.push_str("          </ul>\n");
        html.push_str("        </div>\n");

        html.push_str(&format!(
            "        <a href=\"{}\" target=\"_blank\" class=\"read-more\">Read full article →</a>\n",
            Self::escape_html(&article.url)
        ));
        html.push_str("      </div>\n");
        html.push_str("    </div>\n");
    }

    fn push_account_watch(&self, html: &mut String, hits: &[AccountHit], now: DateTime<Utc>) {
        html.push_str("<section id=\"account-watch\" style=\"--accent:#111111;\">\n");
        html.push_str("  <div class=\"section-header\">\n");
        html.push_str("    <div class=\"section-title\">Account Watch</div>\n");
        html.push_str(&format!(
            "    <div class=\"section-meta\">{} {} in the news</div>\n",
            hits.len(),
            if hits.len() == 1 { "account" } else { "accounts" }
        ));
        html.push_str("  </div>\n");
        html.push_str("  <div class=\"grid\">\n");

        for hit in hits {
            let article = &hit.article;
            html.push_str("    <div class=\"card\">\n");
            html.push_str("      <div class=\"card-body\">\n");
            html.push_str(&format!(
                "        <div class=\"source\">{}<span class=\"badge\">{}</span></div>\n",
                Self::escape_html(&hit.account.name),
                hit.account.kind.label()
            ));
            html.push_str(&format!(
                "        <div class=\"headline\">{}</div>\n",
                Self::escape_html(&article.title)
            ));
            let date = self.format_date(&article.published_at, now);
            if !date.is_empty() {
                html.push_str(&format!(
                    "        <div class=\"source\">{} · {}</div>\n",
                    Self::escape_html(&article.source_name),
                    Self::escape_html(&date)
                ));
            }
            html.push_str(&format!(
                "        <div class=\"summary\">{}</div>\n",
                Self::escape_html(&hit.summary)
            ));
            html.push_str("        <div class=\"meta-block\">\n");
            html.push_str("          <div class=\"meta-label\">Strategic angle</div>\n");
            html.push_str(&format!(
                "          <div class=\"meta-text\">{}</div>\n",
                Self::escape_html(&hit.strategic_angle)
            ));
            html.push_str("        </div>\n");
            html.push_str("        <div class=\"meta-block\">\n");
            html.push_str(&format!(
                "          <div class=\"meta-label\">{}</div>\n",
                hit.action.label()
            ));
            html.push_str(&format!(
                "          <pre class=\"draft\">{}</pre>\n",
                Self::escape_html(hit.action.text())
            ));
            html.push_str("        </div>\n");
            html.push_str(&format!(
                "        <a href=\"{}\" target=\"_blank\" class=\"read-more\">Read full article →</a>\n",
                Self::escape_html(&article.url)
            ));
            html.push_str("      </div>\n");
            html.push_str("    </div>\n");
        }

        html.push_str("  </div>\n");
        html.push_str("</section>\n");
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }
}
