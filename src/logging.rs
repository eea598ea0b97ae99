//! Logging Configuration
//!
//! Structured logging with configurable level and format, plus a request ID
//! that tags every reply generation span.
//!
//! Credentials and email text are never logged; only lengths, tones, error
//! kinds and status codes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format for log lines on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    /// One JSON object per line, with the active reply span attached
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Minimum level handed to the env filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Attach source file and line to each entry
    pub file_and_line: bool,
}

impl LoggingConfig {
    /// Apply `REPLY_ASSISTANT_LOG_LEVEL` / `REPLY_ASSISTANT_LOG_FORMAT`; bad values are ignored
    pub fn apply_env_overrides(&mut self) {
        if let Some(level) = std::env::var("REPLY_ASSISTANT_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.level = level;
        }

        if let Some(format) = std::env::var("REPLY_ASSISTANT_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.format = format;
        }
    }

    /// Install the global subscriber
    ///
    /// Logs go to stderr so command output on stdout stays machine-readable.
    /// `RUST_LOG` takes precedence over the configured level when set.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.file_and_line)
            .with_line_number(self.file_and_line);
        let layer = match self.format {
            LogFormat::Plain => layer.boxed(),
            LogFormat::Json => layer.json().with_current_span(true).boxed(),
        };

        tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init()
            .context("Failed to install log subscriber")?;

        tracing::debug!(log_level = self.level.as_str(), log_format = ?self.format, "Logging ready");
        Ok(())
    }
}

/// Request ID for tracking one reply generation across log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    /// Generate a new request ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
