//! Terminal rendering of list pages.

pub mod tables;

use jiff::Timestamp;
use owo_colors::OwoColorize;

use crate::list::{EmptyState, PageItem, PageWindow};
use crate::model::CampaignStatus;
use crate::remote::{ApiError, ApiErrorKind};

pub use tables::{campaigns_table, contacts_table, emails_table};

/// Pagination bar such as `‹ 1 [2] 3 4 5 … ›`.
///
/// Disabled Previous/Next arrows are dimmed. Returns `None` for a single page.
pub fn pagination_bar(window: &PageWindow) -> Option<String> {
    if !window.is_needed() {
        return None;
    }

    let arrow = |glyph: &str, enabled: bool| {
        if enabled {
            glyph.to_string()
        } else {
            glyph.dimmed().to_string()
        }
    };

    let mut parts = vec![arrow("‹", window.previous_enabled)];
    parts.extend(window.items().into_iter().map(|item| match item {
        PageItem::Page {
            number,
            current: true,
        } => format!("[{number}]").cyan().bold().to_string(),
        PageItem::Page { number, .. } => number.to_string(),
        PageItem::Ellipsis => "…".dimmed().to_string(),
    }));
    parts.push(arrow("›", window.next_enabled));
    Some(parts.join(" "))
}

/// "Showing 11 to 20 of 150 results".
pub fn results_summary(page: u32, limit: u32, shown: usize, total: u64) -> String {
    if shown == 0 {
        return format!("Showing 0 of {total} results");
    }
    let first = u64::from(page.saturating_sub(1)) * u64::from(limit) + 1;
    let last = first + shown as u64 - 1;
    format!("Showing {first} to {last} of {total} results")
}

pub fn empty_panel(state: EmptyState, noun: &str) -> String {
    let title = state.title(noun).bold().to_string();
    match state.hint() {
        Some(hint) => format!("{title}\n{}", hint.dimmed()),
        None => title,
    }
}

pub fn error_panel(error: &ApiError) -> String {
    let heading = match error.kind() {
        ApiErrorKind::Network => "Could not reach the server",
        ApiErrorKind::Auth => "Your session has expired",
        ApiErrorKind::Client | ApiErrorKind::Decode => "The request failed",
        ApiErrorKind::Server => "The server had a problem",
    };
    let retry = match error.kind() {
        ApiErrorKind::Auth => "Sign in again with `mailboard login <email>`.",
        _ => "Run the command again to retry.",
    };
    format!(
        "{}\n{}\n{}",
        heading.red().bold(),
        error.message(),
        retry.dimmed()
    )
}

/// Marker printed above a page served from stale cache data.
pub fn stale_badge() -> String {
    "(refreshing…)".yellow().to_string()
}

/// `2026-09-14T08:00:00Z` as `Sep 14, 2026`. Unparseable input is shown as is.
pub fn format_date(raw: &str) -> String {
    match raw.parse::<Timestamp>() {
        Ok(ts) => ts.strftime("%b %d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn format_status_colored(status: CampaignStatus) -> String {
    let badge = status.to_string();
    match status {
        CampaignStatus::Active => badge.green().to_string(),
        CampaignStatus::Paused => badge.yellow().to_string(),
        CampaignStatus::Completed => badge.dimmed().to_string(),
    }
}

/// Whole currency units with thousands separators, e.g. `$12,500`.
pub fn format_currency(amount: u64) -> String {
    format!("${}", group_thousands(amount))
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
