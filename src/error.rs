use std::io;

use sheed_api::SheedApiError;
use thiserror::Error;

use crate::logging::LogError;

/// Errors surfaced by the page runtime and the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("invalid page URL `{value}`: {source}")]
    InvalidPageUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Api(#[from] SheedApiError),
    #[error(transparent)]
    Logging(#[from] LogError),
    #[error("failed to install {signal} handler: {source}")]
    Signal {
        signal: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode job request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    pub fn io(operation: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { operation, source }
    }
}
