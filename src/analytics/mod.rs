//! Analytics fetching.
//!
//! The dashboard issues one fixed query for the campaign month. The query
//! goes through the [`AnalyticsSource`] trait so the transport can be swapped
//! (the shipped implementation is [`connect::ConnectClient`]), and the result
//! is kept in an [`cache::AnalyticsCache`] so page refreshes do not re-issue
//! it.

pub mod cache;
pub mod connect;

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::models::AnalyticsRow;
use serde_json::Value;
use std::future::Future;

/// A value bound to a named query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

/// A parameterised SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl AnalyticsQuery {
    /// Page views per day and path for the configured campaign window.
    pub fn page_views(config: &DashboardConfig) -> Self {
        let sql = format!(
            "SELECT Date, PagePath, TotalUsers FROM {} \
             WHERE PagePath LIKE @path AND StartDate = @start AND EndDate = @end",
            config.analytics_table
        );
        Self {
            sql,
            params: vec![
                QueryParam {
                    name: "@path".to_string(),
                    value: config.path_filter.clone(),
                },
                QueryParam {
                    name: "@start".to_string(),
                    value: config.campaign_start.format("%Y-%m-%d").to_string(),
                },
                QueryParam {
                    name: "@end".to_string(),
                    value: config.campaign_end.format("%Y-%m-%d").to_string(),
                },
            ],
        }
    }
}

/// A query execution interface returning `(date, path, users)` rows.
pub trait AnalyticsSource {
    fn execute(
        &self,
        query: &AnalyticsQuery,
    ) -> impl Future<Output = Result<Vec<AnalyticsRow>, DashboardError>> + Send;
}

/// Decode one `[date, path, users]` tuple as returned by the source.
pub fn decode_row(row: &[Value]) -> Result<AnalyticsRow, DashboardError> {
    let [date, path, users, ..] = row else {
        return Err(DashboardError::Connection(format!(
            "expected 3 columns, got {}",
            row.len()
        )));
    };

    let date = date
        .as_str()
        .and_then(parse_row_date)
        .ok_or_else(|| DashboardError::Connection(format!("unreadable date column: {date}")))?;

    let path = path
        .as_str()
        .ok_or_else(|| DashboardError::Connection(format!("unreadable path column: {path}")))?
        .to_string();

    let users = match users {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| DashboardError::Connection(format!("unreadable users column: {users}")))?;

    Ok(AnalyticsRow { date, path, users })
}

/// Accepts `YYYY-MM-DD`, `YYYYMMDD` (GA4's native form) and ISO datetimes.
fn parse_row_date(raw: &str) -> Option<chrono::NaiveDate> {
    use chrono::NaiveDate;

    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .ok()
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}
