use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use sheed_api::{
    ChannelEvent, ChannelMessage, ChannelState, JobRequest, JobResult, SheedApiClient,
    SheedApiError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::AppError;
use crate::form::FormState;
use crate::render::{render_result, ResultPanel};
use crate::view::PageView;

pub type SubmissionId = u64;

/// Sends one job request. Implemented by the HTTP client; tests plug in
/// scripted submitters.
pub trait JobSubmitter: Send + Sync + 'static {
    fn submit(&self, request: JobRequest) -> BoxFuture<'static, Result<JobResult, SheedApiError>>;
}

impl JobSubmitter for SheedApiClient {
    fn submit(&self, request: JobRequest) -> BoxFuture<'static, Result<JobResult, SheedApiError>> {
        let client = self.clone();
        async move { client.submit(&request).await }.boxed()
    }
}

/// Work for the UI task. Producers never touch the view directly.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Channel(ChannelEvent),
    SubmissionSettled {
        id: SubmissionId,
        outcome: Result<JobResult, String>,
    },
    ResetResult,
}

/// What changed on the page after applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChange {
    ChannelState(ChannelState),
    SessionId(String),
    LogAppended(String),
    SubmitControl { enabled: bool, label: &'static str },
    ResultShown(ResultPanel),
    ResultCleared,
    SubmissionFailed(String),
}

/// Handle for producers running on other tasks.
#[derive(Debug, Clone)]
pub struct UiSender {
    sender: mpsc::UnboundedSender<UiEvent>,
}

impl UiSender {
    /// Returns `false` once the runtime is gone.
    pub fn send(&self, event: UiEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Callback suitable for `LogChannel::run`.
    pub fn channel_sink(&self) -> impl FnMut(ChannelEvent) + Send + 'static {
        let sender = self.clone();
        move |event| {
            sender.send(UiEvent::Channel(event));
        }
    }
}

/// Single-threaded owner of the page view.
///
/// The channel task and submission tasks post [`UiEvent`]s; only
/// [`UiRuntime::apply`] mutates the view, so no locks guard it.
pub struct UiRuntime {
    view: PageView,
    origin: Url,
    submitter: Arc<dyn JobSubmitter>,
    sender: UiSender,
    receiver: mpsc::UnboundedReceiver<UiEvent>,
    next_submission_id: SubmissionId,
    in_flight: Option<SubmissionId>,
}

impl UiRuntime {
    pub fn new(origin: Url, form: FormState, submitter: Arc<dyn JobSubmitter>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            view: PageView::new(form),
            origin,
            submitter,
            sender: UiSender { sender },
            receiver,
            next_submission_id: 1,
            in_flight: None,
        }
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn sender(&self) -> UiSender {
        self.sender.clone()
    }

    pub fn in_flight(&self) -> Option<SubmissionId> {
        self.in_flight
    }

    /// Start a submission from the current form and session identifier.
    ///
    /// Must run inside a tokio runtime. The request task always posts exactly
    /// one [`UiEvent::SubmissionSettled`], including when the submitter panics.
    pub fn submit(&mut self) -> Result<Vec<ViewChange>, AppError> {
        if self.in_flight.is_some() || !self.view.submit_control().is_enabled() {
            return Err(AppError::SubmissionInFlight);
        }

        let id = self.next_submission_id;
        self.next_submission_id += 1;
        self.in_flight = Some(id);
        self.view.submit_mut().begin();

        let request = self.view.form.to_job_request(self.view.session_id());
        if !request.has_client_id() {
            warn!(
                submission = id,
                "no session identifier yet; job logs will not stream to this client"
            );
        }
        info!(submission = id, coordinates = %request.coordinates, "submission started");
        self.dispatch(id, request);

        Ok(vec![self.submit_control_change()])
    }

    fn dispatch(&self, id: SubmissionId, request: JobRequest) {
        let submitter = Arc::clone(&self.submitter);
        let sender = self.sender.clone();

        tokio::spawn(async move {
            let job = tokio::spawn(async move { submitter.submit(request).await });
            let outcome = match job.await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(error)) => Err(error.to_string()),
                Err(join_error) if join_error.is_panic() => {
                    Err("submission task panicked".to_string())
                }
                Err(join_error) => Err(format!("submission task aborted: {join_error}")),
            };
            if !sender.send(UiEvent::SubmissionSettled { id, outcome }) {
                debug!(submission = id, "runtime gone before submission settled");
            }
        });
    }

    /// Hide and clear the result panel.
    pub fn reset_result(&mut self) -> Vec<ViewChange> {
        self.apply(UiEvent::ResetResult)
    }

    /// Wait for the next queued event. The runtime holds a sender, so this
    /// only returns `None` if the queue is closed.
    pub async fn next_event(&mut self) -> Option<UiEvent> {
        self.receiver.recv().await
    }

    /// Apply every event already queued, without waiting.
    pub fn flush_pending(&mut self) -> Vec<ViewChange> {
        let mut changes = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            changes.extend(self.apply(event));
        }
        changes
    }

    pub fn apply(&mut self, event: UiEvent) -> Vec<ViewChange> {
        match event {
            UiEvent::Channel(event) => self.apply_channel_event(event),
            UiEvent::SubmissionSettled { id, outcome } => self.apply_settled(id, outcome),
            UiEvent::ResetResult => {
                if self.view.clear_result() {
                    vec![ViewChange::ResultCleared]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn apply_channel_event(&mut self, event: ChannelEvent) -> Vec<ViewChange> {
        match event {
            ChannelEvent::State(state) => {
                self.view.set_channel_state(state);
                vec![ViewChange::ChannelState(state)]
            }
            ChannelEvent::Message(ChannelMessage::ClientId { value }) => {
                debug!(client_id = %value, "session identifier issued");
                self.view.set_session_id(value.clone());
                vec![ViewChange::SessionId(value)]
            }
            ChannelEvent::Message(ChannelMessage::Log { value }) => {
                self.view.log_mut().append(value.clone());
                vec![ViewChange::LogAppended(value)]
            }
            ChannelEvent::Message(ChannelMessage::Unknown { .. })
            | ChannelEvent::Error(_)
            | ChannelEvent::ReconnectScheduled { .. } => Vec::new(),
        }
    }

    fn apply_settled(
        &mut self,
        id: SubmissionId,
        outcome: Result<JobResult, String>,
    ) -> Vec<ViewChange> {
        if self.in_flight != Some(id) {
            warn!(submission = id, in_flight = ?self.in_flight, "settled event for unknown submission");
        }
        self.in_flight = None;
        self.view.submit_mut().restore();
        let mut changes = vec![self.submit_control_change()];

        let rendered = outcome.and_then(|result| {
            render_result(&self.origin, &result).map_err(|error| error.to_string())
        });
        match rendered {
            Ok(panel) => {
                info!(submission = id, kml = %panel.kml.href, "job finished");
                self.view.show_result(panel.clone());
                changes.push(ViewChange::ResultShown(panel));
            }
            Err(message) => {
                warn!(submission = id, error = %message, "job submission failed");
                changes.push(ViewChange::SubmissionFailed(message));
            }
        }
        changes
    }

    fn submit_control_change(&self) -> ViewChange {
        let control = self.view.submit_control();
        ViewChange::SubmitControl {
            enabled: control.is_enabled(),
            label: control.label(),
        }
    }
}
