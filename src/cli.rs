use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogFormat;

/// Delineate a watershed and stream the job log.
///
/// The page URL (or explicit flags) supplies the pour point; the client waits
/// briefly for a session identifier from the log channel, submits the job,
/// prints every log line as it arrives and finally the result links.
#[derive(Debug, Clone, Parser)]
#[command(name = "sheed", version, about, long_about = None)]
pub struct Cli {
    /// Service origin both endpoints derive from.
    #[arg(long, env = "SHEED_ORIGIN")]
    pub origin: Option<String>,

    /// Page URL whose `lat`, `lon` and `name` query parameters prefill the form.
    /// Also supplies the origin when `--origin` is absent.
    #[arg(long, env = "SHEED_PAGE_URL")]
    pub page_url: Option<String>,

    /// Pour point as `"<lat>, <lon>"`; overrides the page URL.
    #[arg(long, allow_hyphen_values = true)]
    pub coordinates: Option<String>,

    /// Watershed name; overrides the page URL.
    #[arg(long)]
    pub name: Option<String>,

    /// Fraction by which the DEM window grows around the pour point.
    #[arg(long, env = "SHEED_EXPAND_FACTOR")]
    pub expand_factor: Option<String>,

    /// Elevation dataset identifier.
    #[arg(long, env = "SHEED_DEM")]
    pub dem: Option<String>,

    /// Do not snap the pour point to the nearest stream.
    #[arg(long)]
    pub no_snap: bool,

    /// Seconds to wait for a session identifier before submitting without one.
    #[arg(long, default_value_t = 5)]
    pub session_wait_secs: u64,

    /// Optional HTTP timeout for the submission, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep streaming the log after the job settles, until interrupted.
    #[arg(long)]
    pub follow: bool,

    /// Stream the log only; never submit.
    #[arg(long, conflicts_with_all = ["follow", "dry_run"])]
    pub watch: bool,

    /// Print the JSON request body and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Keep only the text between the first and second colon of channel frames.
    #[arg(long)]
    pub legacy_tag_split: bool,

    /// Diagnostics filter directive, e.g. `debug` or `sheed_api=trace`.
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, env = "SHEED_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Diagnostics format on stderr and in the log file.
    #[arg(long, env = "SHEED_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also append diagnostics to this file.
    #[arg(long, env = "SHEED_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}
