//! JSON snapshot output.
//!
//! The `render` command writes one snapshot per run to
//! `{json_output_dir}/{YYYY-MM-DD}/{HHMMSS}.json`, so that repeated runs on
//! the same day keep their history.

use crate::models::ReportSnapshot;
use chrono::{DateTime, Local};
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`ReportSnapshot`] under `json_output_dir`, returning the file path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_snapshot(
    snapshot: &ReportSnapshot,
    json_output_dir: &str,
    now: DateTime<Local>,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        now.format("%Y-%m-%d")
    );
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = format!("{}/{}.json", full_json_dir, now.format("%H%M%S"));
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, entries = snapshot.entries.len(), "Wrote JSON snapshot");

    Ok(output_json_filename)
}
