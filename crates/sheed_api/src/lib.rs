//! Transport-only client primitives for the watershed delineation service.
//!
//! This crate owns URL derivation, wire payloads, the tagged log channel and
//! the job submission endpoint. It contains no page state and no terminal
//! coupling; the `sheed` crate layers the UI runtime on top.
//!
//! Two endpoints share one origin:
//! - `GET /ws` is a text-frame channel carrying `client_id:<id>` and
//!   `log:<message>` frames, driven by [`LogChannel`].
//! - `POST /` accepts a JSON [`JobRequest`] and answers with a [`JobResult`],
//!   sent by [`SheedApiClient`].

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod retry;
pub mod url;

pub use channel::{
    CancellationSignal, ChannelExit, ChannelTransport, FrameStream, LogChannel,
    WebSocketTransport,
};
pub use client::SheedApiClient;
pub use config::SheedApiConfig;
pub use error::SheedApiError;
pub use events::{ChannelEvent, ChannelMessage, ChannelState, TagSplit};
pub use payload::{JobRequest, JobResult, SnapFlag};
pub use reqwest::StatusCode;
pub use retry::ReconnectPolicy;
pub use crate::url::{artifact_url, parse_origin, submit_url, websocket_url};
