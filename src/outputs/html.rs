//! HTML rendering of the dashboard.
//!
//! [`HtmlSink`] records the presenter's calls as typed blocks and renders
//! them through the `templates/dashboard.html` askama template when the page
//! is finished. The author filter is a plain GET form, so the selection
//! arrives back as repeated `author` query parameters on the next page load.

use crate::presenter::{ChartPoint, Column, ColumnKind, ColumnWidth, UiSink, resolve_selection};
use crate::utils::web_link;
use askama::Template;

/// Full dashboard page.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub title: String,
    pub refresh_secs: u64,
    pub blocks: Vec<Block>,
}

/// One rendered element, in presenter call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Header(String),
    Subheader(String),
    /// Progress value in `[0, 1]` (pre-formatted) and its label.
    Progress(String, String),
    Chart(Vec<Bar>),
    /// Legend and the checkbox options.
    Filter(String, Vec<AuthorOption>),
    Table(Vec<HeaderCell>, Vec<Vec<Cell>>),
    Error(String),
    Caption(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: String,
    /// Height as a percentage of the tallest bar.
    pub height: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthorOption {
    pub name: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub label: &'static str,
    pub width: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub numeric: bool,
    /// Set only for link columns holding an http(s) URL.
    pub href: Option<String>,
}

#[derive(Debug)]
pub struct HtmlSink {
    title: String,
    refresh_secs: u64,
    requested: Vec<String>,
    blocks: Vec<Block>,
}

impl HtmlSink {
    /// `requested` is the author selection carried by the request.
    pub fn new(title: &str, refresh_secs: u64, requested: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            refresh_secs,
            requested,
            blocks: Vec::new(),
        }
    }

    /// Render the recorded blocks into a full document.
    ///
    /// # Errors
    ///
    /// Returns the template engine's error if rendering fails.
    pub fn finish(self) -> Result<String, askama::Error> {
        DashboardPage {
            title: self.title,
            refresh_secs: self.refresh_secs,
            blocks: self.blocks,
        }
        .render()
    }
}

fn width_class(width: ColumnWidth) -> &'static str {
    match width {
        ColumnWidth::Small => "w-small",
        ColumnWidth::Medium => "w-medium",
        ColumnWidth::Large => "w-large",
    }
}

fn cell(column: &Column, text: &str) -> Cell {
    let href = match column.kind {
        ColumnKind::Link => web_link(text).map(str::to_string),
        _ => None,
    };
    Cell {
        text: text.to_string(),
        numeric: column.kind == ColumnKind::Number,
        href,
    }
}

impl UiSink for HtmlSink {
    fn header(&mut self, text: &str) {
        self.blocks.push(Block::Header(text.to_string()));
    }

    fn subheader(&mut self, text: &str) {
        self.blocks.push(Block::Subheader(text.to_string()));
    }

    fn progress(&mut self, value: f64, label: &str) {
        self.blocks
            .push(Block::Progress(format!("{value:.4}"), label.to_string()));
    }

    fn bar_chart(&mut self, series: &[ChartPoint]) {
        let max = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);
        let bars = series
            .iter()
            .map(|point| {
                let pct = if max > 0.0 { point.value / max * 100.0 } else { 0.0 };
                Bar {
                    label: point.label.clone(),
                    value: point.value.to_string(),
                    height: format!("{pct:.1}"),
                }
            })
            .collect();
        self.blocks.push(Block::Chart(bars));
    }

    fn multiselect(&mut self, label: &str, options: &[String]) -> Vec<String> {
        let selected = resolve_selection(options, &self.requested);
        let options = options
            .iter()
            .map(|name| AuthorOption {
                name: name.clone(),
                checked: selected.contains(name),
            })
            .collect();
        self.blocks.push(Block::Filter(label.to_string(), options));
        selected
    }

    fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        let headers = columns
            .iter()
            .map(|column| HeaderCell {
                label: column.label,
                width: width_class(column.width),
            })
            .collect();
        let rows = rows
            .iter()
            .map(|row| columns.iter().zip(row).map(|(c, text)| cell(c, text)).collect())
            .collect();
        self.blocks.push(Block::Table(headers, rows));
    }

    fn error(&mut self, message: &str) {
        self.blocks.push(Block::Error(message.to_string()));
    }

    fn caption(&mut self, text: &str) {
        self.blocks.push(Block::Caption(text.to_string()));
    }
}
