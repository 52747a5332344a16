use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;
use tokio_tungstenite::tungstenite;

#[derive(Debug)]
pub enum SheedApiError {
    InvalidOrigin(String),
    UnsupportedScheme(String),
    InvalidArtifactPath(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    WebSocket(tungstenite::Error),
    ChannelClosed,
    Cancelled,
    Unknown(String),
}

impl SheedApiError {
    /// Transport-level failures the caller may try again later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) | Self::WebSocket(_) | Self::ChannelClosed => true,
            Self::Status(status, _) => status.is_server_error(),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorPayload {
    Nested { error: ErrorPayloadFields },
    Flat { error: String },
    Message { message: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
}

impl ErrorPayload {
    fn message(&self) -> Option<&str> {
        let message = match self {
            Self::Nested { error } => error.message.as_deref()?,
            Self::Flat { error } => error.as_str(),
            Self::Message { message } => message.as_str(),
        };
        non_empty_string(message.trim())
    }
}

impl fmt::Display for SheedApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrigin(value) => write!(f, "invalid origin: {value}"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "unsupported origin scheme '{scheme}' (expected http or https)")
            }
            Self::InvalidArtifactPath(value) => write!(f, "invalid artifact path: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::WebSocket(error) => write!(f, "websocket error: {error}"),
            Self::ChannelClosed => write!(f, "channel closed by peer"),
            Self::Cancelled => write!(f, "operation was cancelled"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for SheedApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            Self::WebSocket(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SheedApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for SheedApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl From<tungstenite::Error> for SheedApiError {
    fn from(error: tungstenite::Error) -> Self {
        Self::WebSocket(error)
    }
}

/// Extract a readable message from a failed submission response body.
///
/// The service answers validation failures with plain text (`Invalid input`);
/// JSON bodies carrying `error` or `message` are unwrapped, and an empty body
/// falls back to the status reason.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload.message() {
            return message.to_owned();
        }
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
