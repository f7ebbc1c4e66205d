//! # Advent Dashboard
//!
//! Tracks a blog advent calendar: scrapes the calendar page for submitted
//! posts, joins them with page-view analytics for the campaign month, and
//! renders a report with a completion bar, a daily views chart and a table
//! filterable by author.
//!
//! ## Usage
//!
//! ```sh
//! advent_dashboard serve --port 8501
//! advent_dashboard render -m ./reports -j ./json
//! ```
//!
//! ## Architecture
//!
//! Each cycle follows the same pipeline:
//! 1. **Fetching**: query analytics (cached for an hour) and scrape the calendar
//! 2. **Joining**: match analytics rows to entries by URL, per entry and per day
//! 3. **Presenting**: draw the report into an HTML or Markdown sink

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analytics;
mod cli;
mod config;
mod dashboard;
mod error;
mod join;
mod models;
mod outputs;
mod presenter;
mod scrapers;
mod server;
#[cfg(test)]
mod test_support;
mod utils;

use analytics::connect::{ConnectClient, ConnectCredentials};
use cli::{Cli, Command};
use config::DashboardConfig;
use dashboard::Dashboard;
use outputs::{json, markdown::MarkdownSink};
use scrapers::calendar::CalendarScraper;
use server::{AppState, LiveDashboard};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "advent_dashboard starting up");

    let args = Cli::parse();
    debug!(
        config = ?args.config,
        connect_user = ?args.connect_user,
        token_set = args.connect_token.is_some(),
        command = ?args.command,
        "Parsed CLI arguments"
    );

    let config = Arc::new(DashboardConfig::load(args.config.as_deref())?);
    info!(
        calendar_url = %config.calendar_url,
        campaign_start = %config.campaign_start,
        campaign_end = %config.campaign_end,
        "Configuration ready"
    );

    let credentials = ConnectCredentials {
        user: args.connect_user.clone(),
        token: args.connect_token.clone(),
    };
    let dashboard = build_dashboard(Arc::clone(&config), credentials)?;

    match args.command {
        Command::Serve { port } => {
            let state = AppState {
                dashboard: Arc::new(dashboard),
            };
            server::run_server(state, port).await?;
        }
        Command::Render {
            markdown_output_dir,
            json_output_dir,
            authors,
        } => {
            render_once(&dashboard, &markdown_output_dir, json_output_dir.as_deref(), authors)
                .await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn build_dashboard(
    config: Arc<DashboardConfig>,
    credentials: ConnectCredentials,
) -> Result<LiveDashboard, Box<dyn Error>> {
    let analytics = ConnectClient::new(&config, credentials)?;
    let calendar = CalendarScraper::new(&config)?;
    Ok(Dashboard::new(config, analytics, calendar))
}

/// Run one cycle and write the Markdown report, plus a JSON snapshot if asked.
#[instrument(level = "info", skip(dashboard))]
async fn render_once(
    dashboard: &LiveDashboard,
    markdown_output_dir: &str,
    json_output_dir: Option<&str>,
    authors: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    if let Err(e) = ensure_writable_dir(markdown_output_dir).await {
        error!(
            path = %markdown_output_dir,
            error = %e,
            "Markdown output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let now = Local::now();
    let mut sink = MarkdownSink::new(authors.clone());
    let data = dashboard.render(&mut sink, now).await;

    let output_markdown_filename = format!(
        "{}/advent_calendar_{}.md",
        markdown_output_dir.trim_end_matches('/'),
        now.format("%Y-%m-%d")
    );
    info!(path = %output_markdown_filename, "Writing Markdown");
    if let Err(e) = tokio::fs::write(&output_markdown_filename, sink.finish()).await {
        error!(path = %output_markdown_filename, error = %e, "Failed writing Markdown");
        return Err(e.into());
    }
    info!(path = %output_markdown_filename, entries = data.entries.len(), "Wrote Markdown report");

    if let Some(json_output_dir) = json_output_dir {
        let snapshot = data.snapshot(&authors, now);
        if let Err(e) = json::write_snapshot(&snapshot, json_output_dir, now).await {
            error!(error = %e, "Failed to write JSON snapshot");
            return Err(e);
        }
    }

    Ok(())
}
