use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::{FutureExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SheedApiConfig;
use crate::error::SheedApiError;
use crate::events::{ChannelEvent, ChannelMessage, ChannelState, TagSplit};
use crate::retry::ReconnectPolicy;

/// Teardown signal shared between the channel loop and its owner.
pub type CancellationSignal = Arc<AtomicBool>;

/// Text frames of one open connection. The stream ends when the peer closes.
pub type FrameStream = BoxStream<'static, Result<String, SheedApiError>>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Opens one connection per call. The channel loop calls it again for every
/// reconnect, so implementations must not cache a closed socket.
pub trait ChannelTransport: Send {
    fn connect<'a>(
        &'a mut self,
        url: &'a Url,
    ) -> BoxFuture<'a, Result<FrameStream, SheedApiError>>;
}

/// Production transport over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl ChannelTransport for WebSocketTransport {
    fn connect<'a>(
        &'a mut self,
        url: &'a Url,
    ) -> BoxFuture<'a, Result<FrameStream, SheedApiError>> {
        async move {
            let (socket, response) = tokio_tungstenite::connect_async(url.as_str()).await?;
            debug!(status = %response.status(), "channel handshake complete");
            Ok(text_frames(socket))
        }
        .boxed()
    }
}

/// Keep text frames, drop pings/binary, and end on a close frame.
pub fn text_frames<S>(socket: S) -> FrameStream
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Send + Unpin + 'static,
{
    stream::unfold(Some(socket), |state| async move {
        let mut socket = state?;
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return Some((Ok(text), Some(socket))),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "close frame received");
                    return None;
                }
                Some(Ok(_)) => continue,
                Some(Err(error)) => return Some((Err(SheedApiError::from(error)), None)),
                None => return None,
            }
        }
    })
    .boxed()
}

/// Why [`LogChannel::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelExit {
    Cancelled,
    RetryExhausted { attempts: u32 },
}

/// Self-healing log channel.
///
/// State machine, per connection:
/// `Connecting -> Open -> (Error) -> Closed -> (delay) -> Connecting`.
/// A failed connect skips `Open`. Every close schedules exactly one reconnect
/// after the policy delay; the attempt counter restarts once a connection
/// opens.
#[derive(Debug, Clone)]
pub struct LogChannel {
    url: Url,
    policy: ReconnectPolicy,
    tag_split: TagSplit,
}

impl LogChannel {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            policy: ReconnectPolicy::default(),
            tag_split: TagSplit::default(),
        }
    }

    pub fn from_config(config: &SheedApiConfig) -> Result<Self, SheedApiError> {
        Ok(Self::new(config.channel_url()?)
            .with_policy(config.reconnect)
            .with_tag_split(config.tag_split))
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tag_split(mut self, tag_split: TagSplit) -> Self {
        self.tag_split = tag_split;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn run<T, F>(
        &self,
        transport: &mut T,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> ChannelExit
    where
        T: ChannelTransport + ?Sized,
        F: FnMut(ChannelEvent),
    {
        let mut attempt: u32 = 0;

        loop {
            if is_cancelled(cancellation) {
                return ChannelExit::Cancelled;
            }

            on_event(ChannelEvent::State(ChannelState::Connecting));
            let Some(connected) = await_or_cancel(transport.connect(&self.url), cancellation).await
            else {
                return ChannelExit::Cancelled;
            };

            match connected {
                Ok(frames) => {
                    info!(url = %self.url, "channel open");
                    attempt = 0;
                    on_event(ChannelEvent::State(ChannelState::Open));
                    if self
                        .pump(frames, cancellation, &mut on_event)
                        .await
                        .is_none()
                    {
                        return ChannelExit::Cancelled;
                    }
                }
                Err(error) => {
                    warn!(url = %self.url, %error, "channel connect failed");
                    on_event(ChannelEvent::Error(error.to_string()));
                }
            }

            on_event(ChannelEvent::State(ChannelState::Closed));

            attempt = attempt.saturating_add(1);
            let Some(delay) = self.policy.delay_for(attempt) else {
                warn!(attempts = attempt - 1, "channel reconnect attempts exhausted");
                return ChannelExit::RetryExhausted {
                    attempts: attempt - 1,
                };
            };
            info!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "channel closed, reconnect scheduled"
            );
            on_event(ChannelEvent::ReconnectScheduled { attempt, delay });

            if await_or_cancel(tokio::time::sleep(delay), cancellation)
                .await
                .is_none()
            {
                return ChannelExit::Cancelled;
            }
        }
    }

    /// Forward frames until the connection ends. `None` means cancelled.
    async fn pump<F>(
        &self,
        mut frames: FrameStream,
        cancellation: Option<&CancellationSignal>,
        on_event: &mut F,
    ) -> Option<()>
    where
        F: FnMut(ChannelEvent),
    {
        loop {
            match await_or_cancel(frames.next(), cancellation).await? {
                Some(Ok(text)) => {
                    let message = ChannelMessage::parse_with(&text, self.tag_split);
                    if let ChannelMessage::Unknown { tag, .. } = &message {
                        debug!(?tag, frame = %text, "ignoring unrecognized channel frame");
                    }
                    on_event(ChannelEvent::Message(message));
                }
                Some(Err(error)) => {
                    warn!(%error, "channel read failed");
                    on_event(ChannelEvent::Error(error.to_string()));
                    return Some(());
                }
                None => {
                    debug!("channel stream ended");
                    return Some(());
                }
            }
        }
    }
}

pub fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

/// Await `future` unless the signal trips first; `None` means cancelled.
pub async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Option<F::Output>
where
    F: Future,
{
    if cancellation.is_none() {
        return Some(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return None;
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return None;
            }
            return Some(output);
        }
    }
}
