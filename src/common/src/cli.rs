use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// Logging and configuration-file arguments
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, help = "Configuration file path (defaults to ./promcsv.toml if present)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Only log errors")]
    pub quiet: bool,
}

/// Query and output flags. Only flags given on the command line override
/// the file and environment configuration.
#[derive(Args, Debug, Clone, Default, Serialize)]
pub struct QueryArgs {
    /// Prometheus base URL
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Prometheus query
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Query range start (Unix seconds)
    #[arg(long, allow_negative_numbers = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    /// Query range end (Unix seconds, default now)
    #[arg(long, allow_negative_numbers = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,

    /// Query range step (e.g. 30s, 5m, 1h30m; default 5m)
    #[arg(long, value_parser = parse_duration)]
    #[serde(
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub step: Option<Duration>,

    /// CSV field delimiter
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delim: Option<String>,

    /// Timestamp layout, e.g. "2006-01-02 15:04:05"; "-" prints raw seconds
    #[arg(long = "dateFormat", visible_alias = "date-format")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,

    /// Format timestamps in UTC instead of local time
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub utc: bool,

    /// HTTP request timeout (e.g. 10s)
    #[arg(long, value_parser = parse_duration)]
    #[serde(
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

/// Subcommands that inspect configuration instead of running a query
#[derive(Subcommand, Debug, Clone)]
pub enum CommonCommands {
    /// Show the effective configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate the configuration and exit
    Validate,
}

/// Accepts humantime durations plus a bare `0`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(value).map_err(|e| format!("invalid duration {value:?}: {e}"))
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::{Configuration, DEFAULT_CONFIG_FILE};
    use anyhow::{Context, Result};
    use std::path::Path;
    use tracing_subscriber::EnvFilter;

    /// Log to stderr so stdout only carries the rendered table.
    ///
    /// `--verbose`/`--quiet` win over `RUST_LOG`; without either the default is `warn`.
    pub fn init_logging(args: &CommonArgs) {
        let filter = if args.quiet {
            EnvFilter::new("error")
        } else if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Load configuration, layering command-line overrides on top
    pub fn load_config(config_path: Option<&PathBuf>, overrides: &QueryArgs) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Configuration file not found: {}", path.display());
                }
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_with(path, overrides).context("Failed to load configuration")
            }
            None => Configuration::load_with(Path::new(DEFAULT_CONFIG_FILE), overrides)
                .context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<String> {
        if json {
            return serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON");
        }

        let mut lines = vec![
            "promcsv configuration:".to_string(),
            "======================".to_string(),
            format!("Prometheus URL: {}", config.url),
            format!("Query: {}", config.query),
        ];
        if config.start > 0 {
            lines.push(format!("Range start: {}", config.start));
            lines.push(if config.end > 0 {
                format!("Range end: {}", config.end)
            } else {
                "Range end: now".to_string()
            });
            lines.push(if config.step.is_zero() {
                "Range step: 5m (default)".to_string()
            } else {
                format!("Range step: {}", humantime::format_duration(config.step))
            });
        } else {
            lines.push("Mode: instant query".to_string());
        }
        lines.push(format!("Delimiter: {:?}", config.delim));
        lines.push(format!("Date format: {:?}", config.date_format));
        lines.push(format!("UTC: {}", config.utc));
        lines.push(match config.timeout {
            Some(timeout) => format!("Timeout: {}", humantime::format_duration(timeout)),
            None => "Timeout: none".to_string(),
        });
        Ok(lines.join("\n"))
    }
}
