//! One request/render cycle.
//!
//! 1. **Collect**: run both producers concurrently. Each producer's failure
//!    is logged, turned into a user-facing message and replaced by an empty
//!    result, so nothing downstream ever sees an error.
//! 2. **Join**: attach analytics to the calendar entries.
//! 3. **Present**: draw the report. An analytics failure is shown above the
//!    heading, a calendar failure right below it.

use crate::analytics::cache::AnalyticsCache;
use crate::analytics::{AnalyticsQuery, AnalyticsSource};
use crate::config::DashboardConfig;
use crate::join::{JoinWindow, join_visitors};
use crate::models::{CalendarEntry, DailyVisitors, ReportSnapshot};
use crate::presenter::{self, Completion, UiSink};
use crate::scrapers::CalendarSource;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Joined data of one cycle plus the messages of failed producers.
#[derive(Debug, Clone, Default)]
pub struct CycleData {
    pub entries: Vec<CalendarEntry>,
    pub daily: Vec<DailyVisitors>,
    pub analytics_error: Option<String>,
    pub calendar_error: Option<String>,
}

impl CycleData {
    /// Failure messages in display order.
    pub fn errors(&self) -> Vec<String> {
        self.analytics_error
            .iter()
            .chain(&self.calendar_error)
            .cloned()
            .collect()
    }

    /// Summarise the cycle, keeping only the entries of `authors` if any are given.
    pub fn snapshot(&self, authors: &[String], now: DateTime<Local>) -> ReportSnapshot {
        let completion = Completion::of(&self.entries);
        ReportSnapshot {
            generated_at: now.to_rfc3339(),
            posted: completion.posted,
            filled: completion.filled,
            completion_ratio: completion.ratio(),
            daily: self.daily.clone(),
            entries: presenter::filter_by_authors(&self.entries, authors)
                .into_iter()
                .cloned()
                .collect(),
            errors: self.errors(),
        }
    }
}

pub fn analytics_error_message(e: &impl std::fmt::Display) -> String {
    format!("アナリティクスデータの取得中にエラーが発生しました: {e}")
}

pub fn calendar_error_message(e: &impl std::fmt::Display) -> String {
    format!("データの取得中にエラーが発生しました: {e}")
}

pub struct Dashboard<A, C> {
    config: Arc<DashboardConfig>,
    analytics: A,
    calendar: C,
    cache: AnalyticsCache,
}

impl<A, C> Dashboard<A, C>
where
    A: AnalyticsSource + Sync,
    C: CalendarSource + Sync,
{
    pub fn new(config: Arc<DashboardConfig>, analytics: A, calendar: C) -> Self {
        let cache = AnalyticsCache::new(config.cache_ttl());
        Self {
            config,
            analytics,
            calendar,
            cache,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Run both producers and join their results.
    #[instrument(level = "info", skip_all)]
    pub async fn collect(&self) -> CycleData {
        let query = AnalyticsQuery::page_views(&self.config);
        let (analytics, calendar) = tokio::join!(
            self.cache.get_or_fetch(|| self.analytics.execute(&query)),
            self.calendar.fetch_entries(),
        );

        let mut analytics_error = None;
        let rows = analytics.unwrap_or_else(|e| {
            error!(kind = e.kind(), error = %e, "Analytics fetch failed; continuing without analytics");
            analytics_error = Some(analytics_error_message(&e));
            Arc::new(Vec::new())
        });

        let mut calendar_error = None;
        let entries = calendar.unwrap_or_else(|e| {
            error!(kind = e.kind(), error = %e, "Calendar scrape failed; continuing without entries");
            calendar_error = Some(calendar_error_message(&e));
            Vec::new()
        });

        let window = JoinWindow {
            site_origin: &self.config.site_origin,
            campaign_start: self.config.campaign_start,
        };
        let (entries, daily) = join_visitors(entries, &rows, &window);

        info!(
            entries = entries.len(),
            days = daily.len(),
            analytics_failed = analytics_error.is_some(),
            calendar_failed = calendar_error.is_some(),
            "Cycle data collected"
        );
        CycleData {
            entries,
            daily,
            analytics_error,
            calendar_error,
        }
    }

    /// Collect, then draw everything into `sink`.
    pub async fn render(&self, sink: &mut dyn UiSink, now: DateTime<Local>) -> CycleData {
        let data = self.collect().await;
        if let Some(message) = &data.analytics_error {
            sink.error(message);
        }
        presenter::render(
            sink,
            &self.config.heading,
            data.calendar_error.as_deref(),
            &data.entries,
            &data.daily,
            now,
        );
        data
    }
}
