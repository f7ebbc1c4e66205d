//! Error taxonomy for the dashboard.
//!
//! Producers (the analytics fetcher and the calendar scraper) return
//! [`DashboardError`]; the dashboard cycle catches it at the producer boundary
//! and turns it into a user-visible message plus an empty result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The analytics source was unreachable or the query failed.
    #[error("analytics connection failed: {0}")]
    Connection(String),
    /// The calendar page could not be fetched (network failure or non-2xx).
    #[error("calendar fetch failed: {0}")]
    Fetch(String),
    /// The calendar document did not have the expected structure.
    #[error("calendar parse failed: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DashboardError {
    /// Short machine-friendly name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Connection(_) => "connection",
            DashboardError::Fetch(_) => "fetch",
            DashboardError::Parse(_) => "parse",
            DashboardError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let e = DashboardError::Fetch("HTTP 503".to_string());
        assert_eq!(e.to_string(), "calendar fetch failed: HTTP 503");
        assert_eq!(e.kind(), "fetch");
    }

    #[test]
    fn test_boxes_into_dyn_error() {
        let e: Box<dyn std::error::Error> =
            DashboardError::Config("campaign_start is after campaign_end".to_string()).into();
        assert_eq!(
            e.to_string(),
            "invalid configuration: campaign_start is after campaign_end"
        );
    }
}
