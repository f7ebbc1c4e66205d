//! Joins analytics rows onto calendar entries.
//!
//! Rows are matched by full URL (`site_origin + path`). Only rows dated on or
//! after the campaign start, and only pages that appear in the calendar, are
//! counted.

use crate::models::{AnalyticsRow, CalendarEntry, DailyVisitors};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Fixed parameters of a join.
#[derive(Debug, Clone)]
pub struct JoinWindow<'a> {
    pub site_origin: &'a str,
    pub campaign_start: NaiveDate,
}

/// Format a day as `YYYY年MM月DD日`, then replace every literal `0日` with `日`.
///
/// The replace is a raw substring replace: days 10, 20 and 30 lose their
/// trailing zero (`10日` becomes `1日`), while days 01 to 09 keep their
/// leading zero.
///
/// # Arguments
///
/// * `date` - The calendar day to label
///
/// # Returns
///
/// The display label used for the daily series.
///
/// # Examples
///
/// ```ignore
/// let day = |d| NaiveDate::from_ymd_opt(2024, 12, d).unwrap();
/// assert_eq!(format_date_label(day(5)), "2024年12月05日");
/// assert_eq!(format_date_label(day(20)), "2024年12月2日");
/// ```
pub fn format_date_label(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string().replace("0日", "日")
}

/// Populate `visitors` on each entry and build the per-day series.
///
/// A row counts when its date is on or after the campaign start and
/// `site_origin + path` equals the URL of some entry.
///
/// # Arguments
///
/// * `entries` - Scraped entries, in calendar order
/// * `rows` - Analytics rows for the query window
/// * `window` - Site origin and campaign start used to match rows
///
/// # Returns
///
/// The entries with `visitors` set (0 when nothing matched), and one
/// [`DailyVisitors`] per labelled day, ordered by date. With no analytics
/// rows the entries come back untouched and the series is empty.
///
/// # Examples
///
/// ```ignore
/// let window = JoinWindow { site_origin: "https://www.cdata.com", campaign_start: start };
/// let (entries, daily) = join_visitors(entries, &rows, &window);
/// ```
#[instrument(level = "info", skip_all, fields(entries = entries.len(), rows = rows.len()))]
pub fn join_visitors(
    mut entries: Vec<CalendarEntry>,
    rows: &[AnalyticsRow],
    window: &JoinWindow<'_>,
) -> (Vec<CalendarEntry>, Vec<DailyVisitors>) {
    if rows.is_empty() {
        return (entries, Vec::new());
    }

    let valid_urls: HashSet<&str> = entries
        .iter()
        .filter(|e| e.is_posted())
        .map(|e| e.url.as_str())
        .collect();

    let mut url_visitors: HashMap<String, u64> = HashMap::new();
    // label -> (date, visitors); labels are distinct per date
    let mut date_visitors: HashMap<String, (NaiveDate, u64)> = HashMap::new();
    let mut matched = 0usize;
    let mut before_start = 0usize;

    for row in rows {
        if row.date < window.campaign_start {
            before_start += 1;
            continue;
        }

        let full_url = format!("{}{}", window.site_origin, row.path);
        if !valid_urls.contains(full_url.as_str()) {
            continue;
        }
        matched += 1;

        *url_visitors.entry(full_url).or_insert(0) += row.users;

        let slot = date_visitors
            .entry(format_date_label(row.date))
            .or_insert((row.date, 0));
        slot.1 += row.users;
    }

    for entry in entries.iter_mut() {
        if let Some(&visitors) = url_visitors.get(&entry.url) {
            entry.visitors = visitors;
        }
    }

    let mut daily: Vec<DailyVisitors> = date_visitors
        .into_iter()
        .map(|(date_label, (date, visitors))| DailyVisitors {
            date,
            date_label,
            visitors,
        })
        .collect();
    daily.sort_by_key(|d| d.date);

    info!(
        matched,
        before_start,
        pages = url_visitors.len(),
        days = daily.len(),
        "Joined analytics onto calendar entries"
    );
    debug!(?daily, "Daily visitors");
    (entries, daily)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.cdata.com";

    fn window() -> JoinWindow<'static> {
        JoinWindow {
            site_origin: ORIGIN,
            campaign_start: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, day).unwrap()
    }

    fn row(date: NaiveDate, path: &str, users: u64) -> AnalyticsRow {
        AnalyticsRow {
            date,
            path: path.to_string(),
            users,
        }
    }

    fn entry(url: &str) -> CalendarEntry {
        CalendarEntry::new("a", "t1", url)
    }

    #[test]
    fn test_scenario_same_day_rows_sum() {
        let entries = vec![entry("https://www.cdata.com/jp/blog/p1")];
        let rows = vec![row(d(5), "/jp/blog/p1", 5), row(d(5), "/jp/blog/p1", 3)];

        let (entries, daily) = join_visitors(entries, &rows, &window());
        assert_eq!(entries[0].visitors, 8);
        assert_eq!(
            daily,
            vec![DailyVisitors {
                date: d(5),
                date_label: "2024年12月05日".to_string(),
                visitors: 8,
            }]
        );
    }

    #[test]
    fn test_rows_before_start_are_ignored() {
        let entries = vec![entry("https://www.cdata.com/jp/blog/p1")];
        let rows = vec![
            row(NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(), "/jp/blog/p1", 100),
            row(d(1), "/jp/blog/p1", 2),
        ];

        let (entries, daily) = join_visitors(entries, &rows, &window());
        assert_eq!(entries[0].visitors, 2);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, d(1));
        assert_eq!(daily[0].visitors, 2);
    }

    #[test]
    fn test_same_path_different_days() {
        let entries = vec![entry("https://www.cdata.com/jp/blog/p1")];
        let rows = vec![row(d(3), "/jp/blog/p1", 4), row(d(2), "/jp/blog/p1", 6)];

        let (entries, daily) = join_visitors(entries, &rows, &window());
        assert_eq!(entries[0].visitors, 10);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, d(2));
        assert_eq!(daily[0].visitors, 6);
        assert_eq!(daily[1].date, d(3));
        assert_eq!(daily[1].visitors, 4);
    }

    #[test]
    fn test_daily_sums_across_pages() {
        let entries = vec![
            entry("https://www.cdata.com/jp/blog/p1"),
            CalendarEntry::new("b", "t2", "https://www.cdata.com/jp/blog/p2"),
        ];
        let rows = vec![row(d(7), "/jp/blog/p1", 1), row(d(7), "/jp/blog/p2", 2)];

        let (entries, daily) = join_visitors(entries, &rows, &window());
        assert_eq!(entries[0].visitors, 1);
        assert_eq!(entries[1].visitors, 2);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].visitors, 3);
    }

    #[test]
    fn test_untracked_pages_are_ignored() {
        let entries = vec![entry("https://www.cdata.com/jp/blog/p1"), CalendarEntry::new("b", "", "")];
        let rows = vec![row(d(4), "/jp/blog/other", 9), row(d(4), "", 9)];

        let (entries, daily) = join_visitors(entries, &rows, &window());
        assert!(entries.iter().all(|e| e.visitors == 0));
        assert!(daily.is_empty());
    }

    #[test]
    fn test_empty_rows_return_entries_unchanged() {
        let entries = vec![entry("https://www.cdata.com/jp/blog/p1")];
        let (joined, daily) = join_visitors(entries.clone(), &[], &window());
        assert_eq!(joined, entries);
        assert!(daily.is_empty());
    }

    #[test]
    fn test_join_is_idempotent() {
        let entries = vec![
            entry("https://www.cdata.com/jp/blog/p1"),
            CalendarEntry::new("b", "t2", "https://www.cdata.com/jp/blog/p2"),
        ];
        let rows = vec![
            row(d(10), "/jp/blog/p1", 3),
            row(d(1), "/jp/blog/p2", 5),
            row(d(20), "/jp/blog/p1", 7),
        ];

        let first = join_visitors(entries.clone(), &rows, &window());
        let second = join_visitors(entries, &rows, &window());
        assert_eq!(first, second);
    }

    #[test]
    fn test_daily_is_ordered_by_date_not_label() {
        // "2024年12月1日" (day 10) would sort before "2024年12月09日" as a string
        let entries = vec![entry("https://www.cdata.com/jp/blog/p1")];
        let rows = vec![row(d(10), "/jp/blog/p1", 1), row(d(9), "/jp/blog/p1", 1)];

        let (_, daily) = join_visitors(entries, &rows, &window());
        let labels: Vec<&str> = daily.iter().map(|d| d.date_label.as_str()).collect();
        assert_eq!(labels, vec!["2024年12月09日", "2024年12月1日"]);
    }

    #[test]
    fn test_date_label_literal_replace() {
        for day in 1..=31 {
            let label = format_date_label(d(day));
            let expected = match day {
                10 => "2024年12月1日".to_string(),
                20 => "2024年12月2日".to_string(),
                30 => "2024年12月3日".to_string(),
                _ => format!("2024年12月{day:02}日"),
            };
            assert_eq!(label, expected, "day {day}");
        }
    }

    #[test]
    fn test_date_label_keeps_month_zero() {
        let label = format_date_label(NaiveDate::from_ymd_opt(2024, 10, 5).unwrap());
        assert_eq!(label, "2024年10月05日");
    }
}
