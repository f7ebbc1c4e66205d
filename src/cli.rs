//! Command-line interface definitions.
//!
//! Every dashboard parameter has a built-in default, so the flags here only
//! cover credentials, the optional settings file, and where output goes. All
//! flags can also be provided through environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the advent calendar dashboard.
///
/// # Examples
///
/// ```sh
/// # Serve the interactive dashboard on port 8501
/// CONNECT_TOKEN=... advent_dashboard serve
///
/// # Write a Markdown report (and a JSON snapshot) for two authors
/// advent_dashboard render -m ./reports -j ./json -a alice -a bob
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML file overriding the built-in settings
    #[arg(short, long, env = "DASHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Analytics user name (used with AuthScheme=Basic)
    #[arg(long, env = "CONNECT_USER")]
    pub connect_user: Option<String>,

    /// Analytics access token (OAuth bearer token or personal access token)
    #[arg(long, env = "CONNECT_TOKEN", hide_env_values = true)]
    pub connect_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the interactive dashboard over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "DASHBOARD_PORT", default_value_t = 8501)]
        port: u16,
    },
    /// Run one cycle and write the report to disk
    Render {
        /// Output directory for the Markdown report
        #[arg(short, long)]
        markdown_output_dir: String,

        /// Output directory for the JSON snapshot
        #[arg(short, long)]
        json_output_dir: Option<String>,

        /// Only list entries by this author (repeatable)
        #[arg(short, long = "author")]
        authors: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_serve_defaults() {
        let cli = Cli::parse_from(["advent_dashboard", "serve"]);
        assert!(cli.config.is_none());
        match cli.command {
            Command::Serve { port } => assert_eq!(port, 8501),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_render_short_flags() {
        let cli = Cli::parse_from([
            "advent_dashboard",
            "--config",
            "dashboard.yaml",
            "render",
            "-m",
            "/tmp/markdown",
            "-j",
            "/tmp/json",
            "-a",
            "alice",
            "-a",
            "bob",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("dashboard.yaml")));
        match cli.command {
            Command::Render {
                markdown_output_dir,
                json_output_dir,
                authors,
            } => {
                assert_eq!(markdown_output_dir, "/tmp/markdown");
                assert_eq!(json_output_dir.as_deref(), Some("/tmp/json"));
                assert_eq!(authors, vec!["alice", "bob"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_render_requires_markdown_dir() {
        assert!(Cli::try_parse_from(["advent_dashboard", "render"]).is_err());
    }
}
