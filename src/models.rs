//! Data models shared by the producers, the joiner and the presenter.
//!
//! - [`AnalyticsRow`]: one row returned by the analytics query
//! - [`CalendarEntry`]: one scraped calendar slot, later enriched with visitors
//! - [`DailyVisitors`]: visitors aggregated per campaign day
//! - [`ReportSnapshot`]: serialisable summary of one render cycle

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single analytics row: users who viewed `path` on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRow {
    pub date: NaiveDate,
    /// Site-relative page path, e.g. `/jp/blog/some-post`.
    pub path: String,
    pub users: u64,
}

/// One calendar slot as scraped from the calendar page.
///
/// Any of `author`, `title` and `url` may be empty (a slot can be reserved
/// before the post is written), but never all three at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub author: String,
    pub title: String,
    pub url: String,
    pub visitors: u64,
}

impl CalendarEntry {
    pub fn new(author: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            url: url.into(),
            visitors: 0,
        }
    }

    /// `true` when the slot carries no information at all.
    pub fn is_blank(&self) -> bool {
        self.author.is_empty() && self.title.is_empty() && self.url.is_empty()
    }

    /// A slot counts as filled once both author and title are known.
    pub fn is_filled(&self) -> bool {
        !self.author.is_empty() && !self.title.is_empty()
    }

    /// A slot counts as posted once it links to an article.
    pub fn is_posted(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Visitors summed over one campaign day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVisitors {
    pub date: NaiveDate,
    /// Display label, see [`crate::join::format_date_label`].
    pub date_label: String,
    pub visitors: u64,
}

/// Everything one render cycle produced, in a shape suitable for JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// RFC 3339 local timestamp.
    pub generated_at: String,
    pub posted: usize,
    pub filled: usize,
    pub completion_ratio: f64,
    pub daily: Vec<DailyVisitors>,
    pub entries: Vec<CalendarEntry>,
    /// User-facing messages for producers that failed during the cycle.
    #[serde(default)]
    pub errors: Vec<String>,
}
