use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const TAG_CLIENT_ID: &str = "client_id";
pub const TAG_LOG: &str = "log";

/// How the value of a tagged frame is cut out of the raw text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSplit {
    /// Everything after the first `:` is the value.
    #[default]
    FirstColon,
    /// Only the segment between the first and second `:` is the value.
    ///
    /// Values containing a colon get truncated; kept for byte compatibility
    /// with the first generation of the web page.
    Legacy,
}

/// A server-to-client frame on the log channel after tag dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    ClientId { value: String },
    Log { value: String },
    /// Frame with an unrecognized or missing tag, kept for diagnostics only.
    Unknown { tag: Option<String>, raw: String },
}

impl ChannelMessage {
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, TagSplit::default())
    }

    pub fn parse_with(text: &str, split: TagSplit) -> Self {
        let Some((tag, rest)) = text.split_once(':') else {
            return Self::Unknown {
                tag: None,
                raw: text.to_owned(),
            };
        };

        let value = match split {
            TagSplit::FirstColon => rest,
            TagSplit::Legacy => rest.split(':').next().unwrap_or_default(),
        };

        match tag {
            TAG_CLIENT_ID => Self::ClientId {
                value: value.to_owned(),
            },
            TAG_LOG => Self::Log {
                value: value.to_owned(),
            },
            other => Self::Unknown {
                tag: Some(other.to_owned()),
                raw: text.to_owned(),
            },
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::ClientId { .. } => Some(TAG_CLIENT_ID),
            Self::Log { .. } => Some(TAG_LOG),
            Self::Unknown { tag, .. } => tag.as_deref(),
        }
    }
}

/// Lifecycle of one channel connection. There is no terminal state; only
/// cancellation stops the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the channel loop reports to its owner, in occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    State(ChannelState),
    Message(ChannelMessage),
    /// Connect or read failure. Diagnostic only; recovery follows the close.
    Error(String),
    ReconnectScheduled { attempt: u32, delay: Duration },
}
