use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use pretty_assertions::assert_eq;
use sheed::runtime::SubmissionId;
use sheed::view::{SUBMIT_BUSY_LABEL, SUBMIT_LABEL};
use sheed::{AppError, FormState, JobSubmitter, QueryParams, UiEvent, UiRuntime, ViewChange};
use sheed_api::{
    CancellationSignal, ChannelEvent, ChannelMessage, ChannelState, ChannelTransport, FrameStream,
    JobRequest, JobResult, LogChannel, SheedApiError, StatusCode,
};
use tokio::sync::oneshot;
use tokio::time::timeout;
use url::Url;

#[derive(Clone, Default)]
struct RecordingSubmitter {
    requests: Arc<Mutex<Vec<JobRequest>>>,
    outcome: Arc<Mutex<Option<Result<JobResult, SheedApiError>>>>,
}

impl RecordingSubmitter {
    fn succeeding(result: JobResult) -> Self {
        let submitter = Self::default();
        *submitter.outcome.lock().expect("outcome") = Some(Ok(result));
        submitter
    }

    fn failing(error: SheedApiError) -> Self {
        let submitter = Self::default();
        *submitter.outcome.lock().expect("outcome") = Some(Err(error));
        submitter
    }

    fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().expect("requests").clone()
    }
}

impl JobSubmitter for RecordingSubmitter {
    fn submit(&self, request: JobRequest) -> BoxFuture<'static, Result<JobResult, SheedApiError>> {
        self.requests.lock().expect("requests").push(request);
        let outcome = self
            .outcome
            .lock()
            .expect("outcome")
            .take()
            .unwrap_or_else(|| Err(SheedApiError::Unknown("no scripted outcome".to_string())));
        async move { outcome }.boxed()
    }
}

struct PanickingSubmitter;

impl JobSubmitter for PanickingSubmitter {
    fn submit(&self, _request: JobRequest) -> BoxFuture<'static, Result<JobResult, SheedApiError>> {
        futures_util::future::lazy(|_| -> Result<JobResult, SheedApiError> {
            panic!("submitter blew up")
        })
        .boxed()
    }
}

/// Holds every submission until the test releases it.
struct GatedSubmitter {
    gates: Mutex<VecDeque<oneshot::Receiver<Result<JobResult, SheedApiError>>>>,
}

impl JobSubmitter for GatedSubmitter {
    fn submit(&self, _request: JobRequest) -> BoxFuture<'static, Result<JobResult, SheedApiError>> {
        let gate = self.gates.lock().expect("gates").pop_front();
        async move {
            match gate {
                Some(gate) => gate.await.unwrap_or(Err(SheedApiError::Cancelled)),
                None => Err(SheedApiError::Unknown("no gate".to_string())),
            }
        }
        .boxed()
    }
}

fn origin() -> Url {
    Url::parse("https://watershed.example/").expect("origin")
}

fn job_result(kml: &str, geojson: &str) -> JobResult {
    JobResult {
        lat: 45.0,
        lon: -122.0,
        kml: kml.to_string(),
        geojson: geojson.to_string(),
        clipped: None,
        dem: None,
        expand_factor: None,
        name: None,
    }
}

fn idle_runtime(form: FormState) -> UiRuntime {
    UiRuntime::new(origin(), form, Arc::new(RecordingSubmitter::default()))
}

fn prefilled_form() -> FormState {
    FormState::prefilled(&QueryParams::parse("lat=45.0&lon=-122.0&name=TestCreek"))
}

fn channel(message: &str) -> UiEvent {
    UiEvent::Channel(ChannelEvent::Message(ChannelMessage::parse(message)))
}

async fn settle(runtime: &mut UiRuntime) -> Vec<ViewChange> {
    let event = timeout(Duration::from_secs(5), runtime.next_event())
        .await
        .expect("settled event in time")
        .expect("queue open");
    assert!(
        matches!(event, UiEvent::SubmissionSettled { .. }),
        "unexpected event {event:?}"
    );
    runtime.apply(event)
}

#[test]
fn channel_messages_update_session_and_log() {
    let mut runtime = idle_runtime(prefilled_form());

    runtime.apply(UiEvent::Channel(ChannelEvent::State(ChannelState::Open)));
    let changes = runtime.apply(channel("client_id:ab12"));
    assert_eq!(changes, vec![ViewChange::SessionId("ab12".to_string())]);
    runtime.apply(channel("log:hello"));

    assert_eq!(runtime.view().session_id(), "ab12");
    assert_eq!(runtime.view().log().lines(), ["hello"]);
    assert!(runtime.view().log().is_visible());
    assert_eq!(runtime.view().channel_state(), ChannelState::Open);

    // A reconnect issues a fresh identifier; the log survives.
    runtime.apply(UiEvent::Channel(ChannelEvent::State(ChannelState::Closed)));
    runtime.apply(channel("client_id:cd34"));
    runtime.apply(channel("log:hello"));

    assert_eq!(runtime.view().session_id(), "cd34");
    assert_eq!(runtime.view().log().lines(), ["hello", "hello"]);
    assert_eq!(runtime.view().log().scroll(), 1);
}

#[test]
fn log_value_keeps_text_after_first_colon() {
    let mut runtime = idle_runtime(FormState::default());
    runtime.apply(channel("log:step 2: filling sinks"));
    assert_eq!(runtime.view().log().newest(), Some("step 2: filling sinks"));
}

#[tokio::test]
async fn successful_submission_renders_panel_and_restores_control() {
    let submitter = RecordingSubmitter::succeeding(job_result("out/x.kml", "out/x.geojson"));
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(submitter.clone()));
    runtime.apply(channel("client_id:ab12"));

    let changes = runtime.submit().expect("submit");
    assert_eq!(
        changes,
        vec![ViewChange::SubmitControl {
            enabled: false,
            label: SUBMIT_BUSY_LABEL
        }]
    );
    assert!(!runtime.view().submit_control().is_enabled());
    assert_eq!(runtime.view().submit_control().label(), SUBMIT_BUSY_LABEL);

    let changes = settle(&mut runtime).await;
    assert_eq!(
        changes[0],
        ViewChange::SubmitControl {
            enabled: true,
            label: SUBMIT_LABEL
        }
    );
    assert!(matches!(changes[1], ViewChange::ResultShown(_)));

    let requests = submitter.requests();
    assert_eq!(
        requests,
        vec![JobRequest::new("45.0, -122.0", "TestCreek", "0.05", "ab12", "USGS10m", true)]
    );

    let view = runtime.view();
    assert!(view.submit_control().is_enabled());
    assert_eq!(view.submit_control().label(), SUBMIT_LABEL);
    assert!(view.is_result_visible());
    let panel = view.result().expect("panel");
    assert!(panel.kml.href.ends_with("out/x.kml"));
    assert!(panel.geojson.href.ends_with("out/x.geojson"));
    assert!(panel.map.href.contains("kml=https://watershed.example/out/x.kml"));
    assert_eq!(runtime.in_flight(), None);
}

#[tokio::test]
async fn request_uses_identifier_current_at_submit_time() {
    let submitter = RecordingSubmitter::succeeding(job_result("a.kml", "a.geojson"));
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(submitter.clone()));
    runtime.apply(channel("client_id:old"));
    runtime.apply(channel("client_id:new"));

    runtime.submit().expect("submit");
    settle(&mut runtime).await;

    assert_eq!(submitter.requests()[0].client_id, "new");
}

#[tokio::test]
async fn submission_without_identifier_still_goes_out() {
    let submitter = RecordingSubmitter::succeeding(job_result("a.kml", "a.geojson"));
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(submitter.clone()));

    runtime.submit().expect("submit");
    settle(&mut runtime).await;

    assert_eq!(submitter.requests()[0].client_id, "");
    assert!(runtime.view().is_result_visible());
}

#[tokio::test]
async fn failed_submission_restores_control_without_panel() {
    let submitter = RecordingSubmitter::failing(SheedApiError::Status(
        status(400),
        "Invalid input".to_string(),
    ));
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(submitter));
    runtime.apply(channel("client_id:ab12"));

    runtime.submit().expect("submit");
    let changes = settle(&mut runtime).await;

    assert!(matches!(
        &changes[1],
        ViewChange::SubmissionFailed(message) if message.contains("Invalid input")
    ));
    assert!(runtime.view().submit_control().is_enabled());
    assert_eq!(runtime.view().submit_control().label(), SUBMIT_LABEL);
    assert!(!runtime.view().is_result_visible());
}

#[tokio::test]
async fn failed_resubmission_keeps_previous_panel() {
    let first = job_result("first.kml", "first.geojson");
    let gated = GatedSubmitter {
        gates: Mutex::new(VecDeque::new()),
    };
    let (release_first, first_gate) = oneshot::channel();
    let (release_second, second_gate) = oneshot::channel();
    gated.gates.lock().expect("gates").extend([first_gate, second_gate]);
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(gated));

    runtime.submit().expect("first submit");
    assert!(matches!(runtime.submit(), Err(AppError::SubmissionInFlight)));
    release_first.send(Ok(first)).expect("release first");
    settle(&mut runtime).await;
    let shown = runtime.view().result().cloned().expect("first panel");

    runtime.submit().expect("second submit");
    release_second
        .send(Err(SheedApiError::Unknown("network down".to_string())))
        .expect("release second");
    settle(&mut runtime).await;

    assert_eq!(runtime.view().result(), Some(&shown));
    assert!(runtime.view().submit_control().is_enabled());
}

#[tokio::test]
async fn panicking_submitter_still_settles() {
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(PanickingSubmitter));

    runtime.submit().expect("submit");
    let changes = settle(&mut runtime).await;

    assert!(matches!(
        &changes[1],
        ViewChange::SubmissionFailed(message) if message.contains("panicked")
    ));
    assert!(runtime.view().submit_control().is_enabled());
    assert_eq!(runtime.in_flight(), None);
    runtime.submit().expect("control usable again");
}

#[tokio::test]
async fn reset_hides_and_clears_panel() {
    let submitter = RecordingSubmitter::succeeding(job_result("a.kml", "a.geojson"));
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(submitter));
    runtime.submit().expect("submit");
    settle(&mut runtime).await;
    assert!(runtime.view().is_result_visible());

    assert_eq!(runtime.reset_result(), vec![ViewChange::ResultCleared]);
    assert!(!runtime.view().is_result_visible());
    assert_eq!(runtime.view().result(), None);
}

#[tokio::test]
async fn queued_reset_is_applied_by_flush() {
    let submitter = RecordingSubmitter::succeeding(job_result("a.kml", "a.geojson"));
    let mut runtime = UiRuntime::new(origin(), prefilled_form(), Arc::new(submitter));
    runtime.submit().expect("submit");
    settle(&mut runtime).await;

    let sender = runtime.sender();
    assert!(sender.send(UiEvent::ResetResult));
    assert!(sender.send(channel("log:after reset")));

    let changes = runtime.flush_pending();
    assert_eq!(
        changes,
        vec![
            ViewChange::ResultCleared,
            ViewChange::LogAppended("after reset".to_string())
        ]
    );
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).expect("status code")
}

struct ReissuingTransport {
    scripts: VecDeque<Vec<String>>,
    cancel_after: usize,
    connects: usize,
    cancellation: CancellationSignal,
}

impl ChannelTransport for ReissuingTransport {
    fn connect<'a>(
        &'a mut self,
        _url: &'a Url,
    ) -> BoxFuture<'a, Result<FrameStream, SheedApiError>> {
        self.connects += 1;
        if self.connects > self.cancel_after {
            self.cancellation.store(true, Ordering::Release);
        }
        let frames = self.scripts.pop_front().unwrap_or_default();
        async move { Ok(stream::iter(frames.into_iter().map(Ok)).boxed()) }.boxed()
    }
}

#[tokio::test(start_paused = true)]
async fn reconnecting_channel_feeds_newest_identifier_into_view() {
    let cancellation: CancellationSignal = Arc::new(AtomicBool::new(false));
    let mut runtime = idle_runtime(prefilled_form());
    let mut transport = ReissuingTransport {
        scripts: VecDeque::from([
            vec!["client_id:ab12".to_string(), "log:[ab12] started".to_string()],
            vec!["client_id:cd34".to_string()],
        ]),
        cancel_after: 2,
        connects: 0,
        cancellation: Arc::clone(&cancellation),
    };

    let channel = LogChannel::new(Url::parse("wss://watershed.example/ws").expect("ws url"));
    let sink = runtime.sender().channel_sink();
    channel.run(&mut transport, Some(&cancellation), sink).await;

    let changes = runtime.flush_pending();
    let sessions: Vec<&ViewChange> = changes
        .iter()
        .filter(|change| matches!(change, ViewChange::SessionId(_)))
        .collect();
    assert_eq!(sessions.len(), 2);
    assert_eq!(runtime.view().session_id(), "cd34");
    assert_eq!(runtime.view().log().lines(), ["[ab12] started"]);
    assert_eq!(runtime.view().channel_state(), ChannelState::Connecting);
}

#[test]
fn stale_settled_event_is_tolerated() {
    let mut runtime = idle_runtime(prefilled_form());
    let id: SubmissionId = 99;
    let changes = runtime.apply(UiEvent::SubmissionSettled {
        id,
        outcome: Err("late".to_string()),
    });
    assert_eq!(changes.len(), 2);
    assert!(runtime.view().submit_control().is_enabled());
}
