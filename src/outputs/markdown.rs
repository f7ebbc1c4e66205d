//! Markdown rendering of the dashboard, for the one-shot `render` command.

use crate::presenter::{ChartPoint, Column, ColumnKind, UiSink, resolve_selection};
use crate::utils::{escape_markdown_cell, web_link};
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Default)]
pub struct MarkdownSink {
    requested: Vec<String>,
    out: String,
}

impl MarkdownSink {
    /// `requested` is the author selection given on the command line.
    pub fn new(requested: Vec<String>) -> Self {
        Self {
            requested,
            out: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn text_bar(fraction: f64, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

impl UiSink for MarkdownSink {
    fn header(&mut self, text: &str) {
        let _ = writeln!(self.out, "# {text}\n");
    }

    fn subheader(&mut self, text: &str) {
        let _ = writeln!(self.out, "## {text}\n");
    }

    fn progress(&mut self, value: f64, label: &str) {
        let _ = writeln!(self.out, "`{}` {label}\n", text_bar(value, BAR_WIDTH));
    }

    fn bar_chart(&mut self, series: &[ChartPoint]) {
        let max = series.iter().map(|p| p.value).fold(0.0_f64, f64::max);
        self.out.push_str("```text\n");
        for point in series {
            let fraction = if max > 0.0 { point.value / max } else { 0.0 };
            let _ = writeln!(
                self.out,
                "{} {} {}",
                point.label,
                text_bar(fraction, BAR_WIDTH),
                point.value
            );
        }
        self.out.push_str("```\n\n");
    }

    fn multiselect(&mut self, label: &str, options: &[String]) -> Vec<String> {
        let selected = resolve_selection(options, &self.requested);
        let shown = if selected.is_empty() {
            "(すべて)".to_string()
        } else {
            selected.join(", ")
        };
        let _ = writeln!(self.out, "**{label}**: {shown}\n");
        selected
    }

    fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        let header: Vec<&str> = columns.iter().map(|c| c.label).collect();
        let align: Vec<&str> = columns
            .iter()
            .map(|c| match c.kind {
                ColumnKind::Number => "---:",
                _ => "---",
            })
            .collect();
        let _ = writeln!(self.out, "| {} |", header.join(" | "));
        let _ = writeln!(self.out, "| {} |", align.join(" | "));

        for row in rows {
            let cells: Vec<String> = columns
                .iter()
                .zip(row)
                .map(|(column, cell)| {
                    let escaped = escape_markdown_cell(cell);
                    match (column.kind, web_link(cell)) {
                        (ColumnKind::Link, Some(href)) => format!("[{escaped}]({href})"),
                        _ => escaped,
                    }
                })
                .collect();
            let _ = writeln!(self.out, "| {} |", cells.join(" | "));
        }
        self.out.push('\n');
    }

    fn error(&mut self, message: &str) {
        let _ = writeln!(self.out, "> **エラー**: {message}\n");
    }

    fn caption(&mut self, text: &str) {
        let _ = writeln!(self.out, "_{text}_");
    }
}
