use std::time::Duration;

use url::Url;

use crate::error::SheedApiError;
use crate::events::TagSplit;
use crate::retry::ReconnectPolicy;
use crate::url::{parse_origin, submit_url, websocket_url, DEFAULT_ORIGIN};

/// Transport configuration shared by the submission client and the channel.
#[derive(Debug, Clone)]
pub struct SheedApiConfig {
    /// Origin both endpoints are derived from (`https://host[:port]`).
    pub origin: String,
    /// Optional `User-Agent` override for submissions.
    pub user_agent: Option<String>,
    /// Optional request timeout. Submissions carry none by default.
    pub timeout: Option<Duration>,
    /// Schedule used after every channel close.
    pub reconnect: ReconnectPolicy,
    /// Value extraction rule for tagged channel frames.
    pub tag_split: TagSplit,
}

impl Default for SheedApiConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: None,
            timeout: None,
            reconnect: ReconnectPolicy::default(),
            tag_split: TagSplit::default(),
        }
    }
}

impl SheedApiConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_tag_split(mut self, tag_split: TagSplit) -> Self {
        self.tag_split = tag_split;
        self
    }

    pub fn origin_url(&self) -> Result<Url, SheedApiError> {
        parse_origin(&self.origin)
    }

    pub fn channel_url(&self) -> Result<Url, SheedApiError> {
        websocket_url(&self.origin_url()?)
    }

    pub fn submit_url(&self) -> Result<Url, SheedApiError> {
        Ok(submit_url(&self.origin_url()?))
    }
}
