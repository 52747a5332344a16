//! Resolved runtime configuration.
//!
//! Precedence, lowest first: built-in defaults, page URL query, explicit
//! flags. Environment fallbacks for flags are handled by clap.

use std::env;
use std::time::Duration;

use sheed_api::{parse_origin, SheedApiConfig, TagSplit};
use url::Url;

use crate::cli::Cli;
use crate::error::AppError;
use crate::form::{FormState, QueryParams};
use crate::logging::LogConfig;

pub const LEGACY_TAG_SPLIT_ENV: &str = "SHEED_LEGACY_TAG_SPLIT";
pub const DEFAULT_SESSION_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Submit once and exit when the job settles.
    Submit { follow: bool },
    /// Only stream the log.
    Watch,
    /// Print the request body without connecting.
    DryRun,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: SheedApiConfig,
    pub origin: Url,
    pub form: FormState,
    pub log: LogConfig,
    pub session_wait: Duration,
    pub mode: RunMode,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let page_url = cli
            .page_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| {
                Url::parse(value).map_err(|source| AppError::InvalidPageUrl {
                    value: value.to_string(),
                    source,
                })
            })
            .transpose()?;

        let origin_input = match (&cli.origin, &page_url) {
            (Some(origin), _) => origin.clone(),
            (None, Some(page)) => page.origin().ascii_serialization(),
            (None, None) => String::new(),
        };
        let origin = parse_origin(&origin_input)?;

        let mut form = match &page_url {
            Some(page) => FormState::prefilled(&QueryParams::from_page_url(page)),
            None => FormState::default(),
        };
        if let Some(coordinates) = &cli.coordinates {
            form.coordinates = coordinates.trim().to_string();
        }
        if let Some(name) = &cli.name {
            form.name = name.clone();
        }
        if let Some(expand_factor) = non_empty(&cli.expand_factor) {
            form.expand_factor = expand_factor;
        }
        if let Some(dem) = non_empty(&cli.dem) {
            form.dem = dem;
        }
        form.snap = !cli.no_snap;

        let tag_split = if cli.legacy_tag_split || env_flag(LEGACY_TAG_SPLIT_ENV) {
            TagSplit::Legacy
        } else {
            TagSplit::FirstColon
        };

        let mut api = SheedApiConfig::new(origin.as_str())
            .with_user_agent(concat!("sheed/", env!("CARGO_PKG_VERSION")))
            .with_tag_split(tag_split);
        if let Some(seconds) = cli.timeout_secs {
            if seconds == 0 {
                return Err(AppError::InvalidConfig(
                    "--timeout-secs must be greater than zero".to_string(),
                ));
            }
            api = api.with_timeout(Duration::from_secs(seconds));
        }

        let mode = if cli.dry_run {
            RunMode::DryRun
        } else if cli.watch {
            RunMode::Watch
        } else {
            RunMode::Submit { follow: cli.follow }
        };

        Ok(Self {
            api,
            origin,
            form,
            log: LogConfig {
                level: cli.log_level.clone(),
                format: cli.log_format,
                file: cli
                    .log_file
                    .clone()
                    .filter(|path| !path.as_os_str().is_empty()),
            },
            session_wait: Duration::from_secs(cli.session_wait_secs),
            mode,
        })
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).and_then(|value| {
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}
