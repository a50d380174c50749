//! Logging configuration and initialization
//!
//! Centralized tracing setup for all escheat binaries. Use the structured
//! macros (`trace!` .. `error!`) with fields, never `println!`:
//!
//! ```rust,ignore
//! tracing::info!(location = %archive, inserted, skipped, "Chunk committed");
//! ```
//!
//! Environment variables:
//! - `LOG_FILTER`: filter directives (e.g. "info,escheat_server=debug")
//! - `LOG_FORMAT`: "text" (default) or "json"
//! - `LOG_DIR`: when set, logs are also written to a daily-rotated file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured log shippers
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directives, same syntax as `RUST_LOG`
    pub filter: String,

    /// Output format (text or JSON)
    pub format: LogFormat,

    /// Directory for log files; file output is disabled when `None`
    pub log_dir: Option<PathBuf>,

    /// Log file name prefix (e.g. "escheat-server" ->
    /// "escheat-server.2025-06-01.log")
    pub file_prefix: String,
}

impl LogConfig {
    /// Build a configuration from the environment, falling back to the
    /// given filter directives and file prefix.
    pub fn from_env(default_filter: &str, file_prefix: &str) -> Self {
        Self {
            filter: std::env::var("LOG_FILTER")
                .unwrap_or_else(|_| default_filter.to_string()),
            format: std::env::var("LOG_FORMAT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            log_dir: std::env::var("LOG_DIR").ok().map(PathBuf::from),
            file_prefix: file_prefix.to_string(),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at binary startup. Console output is always on; a daily-rotated
/// file sink is added when `log_dir` is configured.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter '{}'", config.filter))?;

    let file_writer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            // The guard must outlive the process for the writer to flush.
            std::mem::forget(guard);
            Some(non_blocking)
        },
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter);

    match (config.format, file_writer) {
        (LogFormat::Text, None) => {
            registry.with(fmt::layer().with_writer(std::io::stdout)).try_init()?;
        },
        (LogFormat::Json, None) => {
            registry
                .with(fmt::layer().json().with_writer(std::io::stdout))
                .try_init()?;
        },
        (LogFormat::Text, Some(file)) => {
            registry
                .with(fmt::layer().with_writer(std::io::stdout))
                .with(fmt::layer().with_writer(file).with_ansi(false))
                .try_init()?;
        },
        (LogFormat::Json, Some(file)) => {
            registry
                .with(fmt::layer().json().with_writer(std::io::stdout))
                .with(fmt::layer().json().with_writer(file).with_ansi(false))
                .try_init()?;
        },
    }

    Ok(())
}
