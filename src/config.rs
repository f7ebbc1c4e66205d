//! Dashboard settings.
//!
//! Every setting has a built-in default; the dashboard runs without any
//! configuration file. An optional YAML file can override any subset of the
//! fields.

use crate::error::DashboardError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_CALENDAR_URL: &str = "https://qiita.com/advent-calendar/2024/cdata";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.cdata.com";
pub const DEFAULT_CONNECT_URL: &str = "https://cloud.cdata.com/api/query";
pub const DEFAULT_CONNECTION_STRING: &str = "AuthScheme=OAuth;";
pub const DEFAULT_ANALYTICS_TABLE: &str =
    "[GoogleAnalytics4].[GoogleAnalytics4].[EngagementPagesPathReport]";

/// CSS selectors locating the parts of one calendar slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarMarkers {
    /// Container of one calendar slot.
    pub slot: String,
    /// Author link inside a slot.
    pub author: String,
    /// Title block inside a slot; its first `<a>` carries the post URL.
    pub title: String,
}

impl Default for CalendarMarkers {
    fn default() -> Self {
        Self {
            slot: "div.style-176zglo".to_string(),
            author: "a.style-zfknvc".to_string(),
            title: "div.style-mpez5z".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub calendar_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub fetch_timeout_secs: u64,
    pub markers: CalendarMarkers,
    /// Prepended to analytics page paths to build the join key.
    pub site_origin: String,
    pub campaign_start: NaiveDate,
    pub campaign_end: NaiveDate,
    pub connect_url: String,
    pub connection_string: String,
    pub analytics_table: String,
    /// `LIKE` pattern restricting the analytics query to blog pages.
    pub path_filter: String,
    pub cache_ttl_secs: u64,
    pub page_title: String,
    pub heading: String,
    /// Interval of the HTML page's automatic refresh.
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            calendar_url: DEFAULT_CALENDAR_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            fetch_timeout_secs: 10,
            markers: CalendarMarkers::default(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            campaign_start: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default(),
            campaign_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            connect_url: DEFAULT_CONNECT_URL.to_string(),
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            analytics_table: DEFAULT_ANALYTICS_TABLE.to_string(),
            path_filter: "%/blog/%".to_string(),
            cache_ttl_secs: 3600,
            page_title: "CData Advent Calendar 2024".to_string(),
            heading: "🎄CData Software Advent Calendar 2024🎄".to_string(),
            refresh_secs: 600,
        }
    }
}

impl DashboardConfig {
    /// Load the configuration, applying the YAML overrides at `path` if given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, DashboardError> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    DashboardError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                let config = Self::from_yaml(&content)?;
                info!(path = %path.display(), "Loaded dashboard configuration");
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, DashboardError> {
        serde_yaml::from_str(content)
            .map_err(|e| DashboardError::Config(format!("failed to parse YAML: {e}")))
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        for (name, value) in [
            ("calendar_url", &self.calendar_url),
            ("site_origin", &self.site_origin),
            ("connect_url", &self.connect_url),
        ] {
            Url::parse(value)
                .map_err(|e| DashboardError::Config(format!("{name} `{value}` is not a URL: {e}")))?;
        }
        if self.campaign_start > self.campaign_end {
            return Err(DashboardError::Config(format!(
                "campaign_start {} is after campaign_end {}",
                self.campaign_start, self.campaign_end
            )));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(
            config.campaign_start,
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
    }

    #[test]
    fn test_partial_yaml_override() {
        let yaml = r#"
calendar_url: "https://qiita.com/advent-calendar/2025/cdata"
campaign_start: "2025-12-01"
campaign_end: "2025-12-31"
markers:
  slot: "div.slot"
"#;
        let config = DashboardConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.calendar_url, "https://qiita.com/advent-calendar/2025/cdata");
        assert_eq!(config.markers.slot, "div.slot");
        // untouched fields keep their defaults
        assert_eq!(config.markers.author, "a.style-zfknvc");
        assert_eq!(config.site_origin, DEFAULT_SITE_ORIGIN);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_inverted_window() {
        let config = DashboardConfig {
            campaign_start: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            campaign_end: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            ..DashboardConfig::default()
        };
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_url() {
        let config = DashboardConfig {
            site_origin: "not a url".to_string(),
            ..DashboardConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("site_origin"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        std::fs::write(&path, "cache_ttl_secs: 60\n").unwrap();

        let config = DashboardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.cache_ttl_secs, 60);

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            DashboardConfig::load(Some(&missing)),
            Err(DashboardError::Config(_))
        ));
    }
}
