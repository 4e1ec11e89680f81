use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Lowercased alphanumeric word set of a title
pub fn title_tokens(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Shared tokens divided by the size of the larger set. Empty sets never overlap.
pub fn overlap_ratio(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / a.len().max(b.len()) as f64
}

pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// "3 hours ago", "Yesterday", "4 days ago"; older items get a calendar date
pub fn format_relative(raw: &str, now: DateTime<Utc>) -> String {
    let Some(published) = parse_published(raw) else {
        return raw.to_string();
    };

    let age = now - published;
    if age < Duration::hours(1) {
        return "Just now".to_string();
    }
    if age < Duration::hours(24) {
        let hours = age.num_hours();
        return if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        };
    }

    match age.num_days() {
        1 => "Yesterday".to_string(),
        days if days < 7 => format!("{} days ago", days),
        _ => published.format("%b %-d, %Y").to_string(),
    }
}

pub fn format_absolute(raw: &str) -> String {
    match parse_published(raw) {
        Some(published) => published.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// Prefix of at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Feed summaries arrive as HTML fragments
pub fn strip_html(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    let text = html2text::from_read(html.as_bytes(), 10_000);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
