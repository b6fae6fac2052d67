use chrono::NaiveDate;

use crate::format::fmt_count;
use crate::stats::{Contribution, Stats};

const NO_CONTRIBUTIONS: &str = "*No notable contributions found.*";

/// The three Markdown fragments spliced into the README.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragments {
    pub stats: String,
    pub notable: String,
    pub updated: String,
}

impl Fragments {
    pub fn render(stats: &Stats, notable: &[Contribution], today: NaiveDate) -> Self {
        Self {
            stats: render_stats(stats),
            notable: render_notable(notable),
            updated: render_updated(today),
        }
    }
}

fn stat_line(emoji: &str, label: &str, value: u64) -> String {
    format!("- {emoji} {label}: **{}**", fmt_count(value))
}

pub fn render_stats(stats: &Stats) -> String {
    let lines = [
        "## Stats".to_string(),
        String::new(),
        stat_line("⭐", "Stars", stats.stars),
        stat_line("💻", "Commits", stats.commits),
        stat_line("🔀", "Pull Requests", stats.pull_requests),
        stat_line("🐛", "Issues", stats.issues),
    ];
    lines.join("\n")
}

pub fn render_notable(contributions: &[Contribution]) -> String {
    let mut lines = vec!["## Notable Contributions".to_string(), String::new()];

    if contributions.is_empty() {
        lines.push(NO_CONTRIBUTIONS.to_string());
        return lines.join("\n");
    }

    lines.extend(
        contributions
            .iter()
            .map(|c| format!("- [{}]({}) ⭐ {}", c.repo, c.repo_url, fmt_count(c.stars))),
    );
    lines.join("\n")
}

/// `*Updated: YYYY-MM-DD*` for the given (UTC) date.
pub fn render_updated(today: NaiveDate) -> String {
    format!("*Updated: {}*", today.format("%Y-%m-%d"))
}
