//! Utility functions for string handling and file system checks.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a character
/// boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Return `raw` if it is safe to render as a clickable link.
///
/// Only absolute `http` and `https` URLs qualify; anything else (relative
/// paths, `javascript:`, `data:`) is shown as plain text by the sinks.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(web_link("https://www.cdata.com/jp/blog/p1"), Some("https://www.cdata.com/jp/blog/p1"));
/// assert_eq!(web_link("javascript:alert(1)"), None);
/// ```
pub fn web_link(raw: &str) -> Option<&str> {
    let parsed = Url::parse(raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(raw)
}

/// Escape text for a Markdown table cell.
pub fn escape_markdown_cell(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('\n', " ")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        // each kana is 3 bytes; 4 bytes lands mid-character
        let result = truncate_for_log("カレンダー", 4);
        assert_eq!(result, "カ…(+12 bytes)");
    }

    #[test]
    fn test_web_link_accepts_http_schemes_only() {
        assert_eq!(
            web_link("https://www.cdata.com/jp/blog/p1"),
            Some("https://www.cdata.com/jp/blog/p1")
        );
        assert_eq!(web_link("http://example.com"), Some("http://example.com"));
        assert_eq!(web_link("javascript:alert(1)"), None);
        assert_eq!(web_link("JavaScript:alert(1)"), None);
        assert_eq!(web_link("data:text/html,<b>x</b>"), None);
        assert_eq!(web_link("/jp/blog/p1"), None);
        assert_eq!(web_link(""), None);
    }

    #[test]
    fn test_escape_markdown_cell() {
        assert_eq!(escape_markdown_cell("a|b\nc"), "a\\|b c");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports/2024");
        ensure_writable_dir(nested.to_str().unwrap()).await.unwrap();
        assert!(nested.is_dir());
    }
}
