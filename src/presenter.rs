//! Report presentation.
//!
//! The presenter knows what to show and in which order; a [`UiSink`] knows
//! how to draw it. The only business rules here are the completion ratio and
//! the author filter.

use crate::models::{CalendarEntry, DailyVisitors};
use chrono::{DateTime, Local};
use itertools::Itertools;
use tracing::{debug, instrument};

pub const NO_DATA_MESSAGE: &str = "データを取得できませんでした。後でもう一度お試しください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Number,
    Text,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    Small,
    Medium,
    Large,
}

/// Display hints for one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub width: ColumnWidth,
}

pub const ENTRY_COLUMNS: [Column; 4] = [
    Column {
        key: "author",
        label: "著者",
        kind: ColumnKind::Text,
        width: ColumnWidth::Medium,
    },
    Column {
        key: "title",
        label: "記事タイトル",
        kind: ColumnKind::Text,
        width: ColumnWidth::Large,
    },
    Column {
        key: "url",
        label: "URL",
        kind: ColumnKind::Link,
        width: ColumnWidth::Medium,
    },
    Column {
        key: "visitors",
        label: "閲覧ユーザー数",
        kind: ColumnKind::Number,
        width: ColumnWidth::Small,
    },
];

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Where a report gets drawn.
pub trait UiSink: Send {
    fn header(&mut self, text: &str);
    fn subheader(&mut self, text: &str);
    /// `value` is in `[0, 1]`.
    fn progress(&mut self, value: f64, label: &str);
    fn bar_chart(&mut self, series: &[ChartPoint]);
    /// Offer `options` and return the user's current selection.
    fn multiselect(&mut self, label: &str, options: &[String]) -> Vec<String>;
    /// Each row holds one cell per column, in column order.
    fn table(&mut self, columns: &[Column], rows: &[Vec<String>]);
    fn error(&mut self, message: &str);
    fn caption(&mut self, text: &str);
}

/// Posted articles against filled slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub posted: usize,
    pub filled: usize,
}

impl Completion {
    pub fn of(entries: &[CalendarEntry]) -> Self {
        Self {
            posted: entries.iter().filter(|e| e.is_posted()).count(),
            filled: entries.iter().filter(|e| e.is_filled()).count(),
        }
    }

    /// Share of filled slots that have been published.
    ///
    /// # Returns
    ///
    /// `posted / filled`, or `0.0` when nothing is filled yet. The value can
    /// exceed 1 when URL-only slots exist; sinks clamp it for display.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// assert_eq!(Completion { posted: 3, filled: 4 }.ratio(), 0.75);
    /// assert_eq!(Completion { posted: 0, filled: 0 }.ratio(), 0.0);
    /// ```
    pub fn ratio(&self) -> f64 {
        if self.filled == 0 {
            0.0
        } else {
            self.posted as f64 / self.filled as f64
        }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.posted, self.filled)
    }
}

/// Distinct non-empty authors, sorted.
pub fn author_options(entries: &[CalendarEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| !e.author.is_empty())
        .map(|e| e.author.clone())
        .sorted()
        .dedup()
        .collect()
}

/// Keep the entries written by any of `selected`; an empty selection keeps all.
pub fn filter_by_authors<'a>(
    entries: &'a [CalendarEntry],
    selected: &[String],
) -> Vec<&'a CalendarEntry> {
    entries
        .iter()
        .filter(|e| selected.is_empty() || selected.contains(&e.author))
        .collect()
}

/// Restrict a requested selection to the offered options, in option order.
pub fn resolve_selection(options: &[String], requested: &[String]) -> Vec<String> {
    options
        .iter()
        .filter(|o| requested.contains(o))
        .cloned()
        .collect()
}

fn entry_cells(entry: &CalendarEntry) -> Vec<String> {
    vec![
        entry.author.clone(),
        entry.title.clone(),
        entry.url.clone(),
        entry.visitors.to_string(),
    ]
}

/// Draw one report.
///
/// `notice` is a failure message shown right under the heading, before the
/// "no data" check, so a failed scrape explains the empty page that follows.
#[instrument(level = "info", skip_all, fields(entries = entries.len(), days = daily.len()))]
pub fn render(
    sink: &mut dyn UiSink,
    heading: &str,
    notice: Option<&str>,
    entries: &[CalendarEntry],
    daily: &[DailyVisitors],
    now: DateTime<Local>,
) {
    sink.header(heading);
    if let Some(message) = notice {
        sink.error(message);
    }

    if entries.is_empty() {
        sink.error(NO_DATA_MESSAGE);
        return;
    }

    let completion = Completion::of(entries);
    sink.subheader("投稿済み記事数");
    sink.progress(completion.ratio().clamp(0.0, 1.0), &completion.label());

    sink.subheader("日別閲覧数");
    if !daily.is_empty() {
        let series: Vec<ChartPoint> = daily
            .iter()
            .map(|d| ChartPoint {
                label: d.date_label.clone(),
                value: d.visitors as f64,
            })
            .collect();
        sink.bar_chart(&series);
    }

    sink.subheader("著者で絞り込み");
    let selected = sink.multiselect("著者", &author_options(entries));

    let rows: Vec<Vec<String>> = filter_by_authors(entries, &selected)
        .into_iter()
        .map(entry_cells)
        .collect();
    debug!(selected = ?selected, shown = rows.len(), "Applied author filter");

    sink.subheader("記事一覧");
    sink.table(&ENTRY_COLUMNS, &rows);

    sink.caption(&format!("最終更新: {}", now.format("%Y-%m-%d %H:%M:%S")));
}
