//! Structured diagnostics for the client.
//!
//! Diagnostics are `tracing` events written to stderr (and optionally a file).
//! The log area itself is page content and goes to stdout through the
//! presenter, never through this module.
//!
//! Field names used across both crates: `url`, `attempt`, `delay_ms`,
//! `client_id`, `coordinates`, `status`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::Subscriber;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter, Layer};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LogError::InvalidFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
    /// Append-only diagnostics file in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),
    #[error("invalid log format `{0}` (expected pretty or json)")]
    InvalidFormat(String),
    #[error("failed to open log file: {0}")]
    FileCreate(#[from] io::Error),
    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Resolve the effective filter: `RUST_LOG` first, then the configured level.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|_| LogError::InvalidLevel(config.level.clone()))
}

/// Open (creating parents as needed) the diagnostics file in append mode.
pub fn open_log_file(path: &Path) -> Result<File, LogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// One formatting layer over `writer`; stderr and the log file share it.
fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => subscriber_fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => subscriber_fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_writer(writer)
            .with_target(true)
            .flatten_event(true)
            .boxed(),
    }
}

/// Install the global subscriber. A second call fails with
/// [`LogError::AlreadyInitialized`].
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let filter = build_filter(config)?;
    let file = config.file.as_deref().map(open_log_file).transpose()?;

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(format_layer(config.format, io::stderr, true))
        .with(file.map(|file| format_layer(config.format, file, false)));
    tracing::subscriber::set_global_default(subscriber)?;

    let _ = LOGGING_INITIALIZED.set(());
    tracing::debug!(
        log_level = %config.level,
        log_format = %config.format,
        log_file = ?config.file,
        "logging initialized"
    );
    Ok(())
}
