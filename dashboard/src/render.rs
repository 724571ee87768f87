//! Plain-text views of API payloads.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use tubegenie_client::schema::{
    AnalyticsSnapshot, ContentItem, GeneratedContent, ModelsPayload, UsageStats,
};
use tubegenie_client::Error;

const RECENT_ON_DASHBOARD: usize = 5;

fn date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn bullets(out: &mut String, heading: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for line in lines {
        let _ = writeln!(out, "  - {}", line);
    }
}

/// Case-insensitive match on topic, titles and description.
pub fn matches_search(item: &ContentItem, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    item.topic.to_lowercase().contains(&term)
        || item.titles.iter().any(|t| t.to_lowercase().contains(&term))
        || item.description.to_lowercase().contains(&term)
}

/// Case-insensitive match on the model that generated the item.
pub fn matches_model(item: &ContentItem, model: &str) -> bool {
    let model = model.trim().to_lowercase();
    model.is_empty() || item.ai_model.to_lowercase().contains(&model)
}

pub fn notice(message: Option<&str>, fallback: &str) -> String {
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn content_list(items: &[ContentItem]) -> String {
    if items.is_empty() {
        return "No content yet.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let star = if item.is_favorite { "*" } else { " " };
        let title = item.titles.first().map(String::as_str).unwrap_or("(untitled)");
        let _ = writeln!(
            out,
            "{} {}  {}  {:<24}  {}",
            star,
            item.id,
            date(&item.created_at),
            item.topic,
            title
        );
    }
    out
}

pub fn content_detail(item: &ContentItem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", item.topic, item.id);
    let _ = writeln!(
        out,
        "model: {}  created: {}  favorite: {}",
        item.ai_model,
        date(&item.created_at),
        if item.is_favorite { "yes" } else { "no" }
    );
    out.push('\n');
    bullets(&mut out, "Titles", &item.titles);
    let _ = writeln!(out, "Description:\n  {}", item.description);
    bullets(&mut out, "Tags", &item.tags);
    bullets(&mut out, "Thumbnail ideas", &item.thumbnail_ideas);
    bullets(&mut out, "Script outline", &item.script_outline);
    out
}

pub fn generated(content: &GeneratedContent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated with {}\n", content.ai_model);
    bullets(&mut out, "Titles", &content.titles);
    let _ = writeln!(out, "Description:\n  {}", content.description);
    bullets(&mut out, "Tags", &content.tags);
    bullets(&mut out, "Thumbnail ideas", &content.thumbnail_ideas);
    bullets(&mut out, "Script outline", &content.script_outline);
    out
}

pub fn models(payload: &ModelsPayload) -> String {
    let selected = payload.default_selection().map(|m| m.id.as_str());
    let mut out = String::new();
    for model in &payload.data {
        let marker = if Some(model.id.as_str()) == selected { ">" } else { " " };
        let _ = writeln!(
            out,
            "{} {:<16} {} ({})",
            marker, model.id, model.name, model.provider
        );
        if !model.description.is_empty() {
            let _ = writeln!(out, "    {}", model.description);
        }
    }
    out
}

fn usage(out: &mut String, stats: &UsageStats) {
    let _ = writeln!(
        out,
        "This week: {}  This month: {}  All time: {}  Avg/week: {:.1}",
        stats.this_week, stats.this_month, stats.all_time, stats.average_per_week
    );
}

pub fn dashboard(snapshot: &AnalyticsSnapshot, recent: &[ContentItem]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Content: {}  Favorites: {}",
        snapshot.total_content, snapshot.total_favorites
    );
    usage(&mut out, &snapshot.usage_stats);
    out.push_str("\nRecent content:\n");
    let shown = &recent[..recent.len().min(RECENT_ON_DASHBOARD)];
    out.push_str(&content_list(shown));
    out
}

pub fn analytics(snapshot: &AnalyticsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Content: {}  Favorites: {}",
        snapshot.total_content, snapshot.total_favorites
    );
    usage(&mut out, &snapshot.usage_stats);

    let by_model: Vec<String> = snapshot
        .content_by_model
        .iter()
        .map(|m| format!("{}: {} ({:.0}%)", m.model_name, m.count, m.percentage))
        .collect();
    out.push('\n');
    bullets(&mut out, "By model", &by_model);

    let topics: Vec<String> = snapshot
        .top_topics
        .iter()
        .map(|t| format!("{} x{} (last {})", t.topic, t.count, date(&t.last_generated)))
        .collect();
    bullets(&mut out, "Top topics", &topics);

    let timeline: Vec<String> = snapshot
        .generation_timeline
        .iter()
        .map(|p| format!("{} {}", p.date, "#".repeat(p.count.min(60) as usize)))
        .collect();
    bullets(&mut out, "Timeline", &timeline);

    let tags: Vec<String> = snapshot
        .tag_cloud
        .iter()
        .map(|t| format!("{} ({})", t.tag, t.count))
        .collect();
    bullets(&mut out, "Tags", &tags);
    out
}

/// One-line failure notice, with a hint when retrying may help.
pub fn failure(err: &Error) -> String {
    if err.is_retryable() {
        format!("error: {} (try again)", err)
    } else {
        format!("error: {}", err)
    }
}
