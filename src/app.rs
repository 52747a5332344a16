use std::io::Write;
use std::time::Duration;

use sheed_api::channel::is_cancelled;
use sheed_api::CancellationSignal;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use crate::error::AppError;
use crate::present::Presenter;
use crate::runtime::{UiRuntime, ViewChange};

/// How often the driver re-checks the cancellation flag while idle.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Upper bound on how long a settled one-shot run keeps printing trailing
/// log lines.
const TRAILING_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Submit once the session is identified (or the wait runs out); return
    /// when the job settles unless `follow` is set.
    Submit { follow: bool, session_wait: Duration },
    Watch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed(String),
    Interrupted,
}

/// Run the UI loop: apply queued events, print what changed, and trigger the
/// submission. Returns when the job settles (one-shot, after printing any
/// trailing lines) or on cancellation.
pub async fn drive<W: Write>(
    runtime: &mut UiRuntime,
    presenter: &mut Presenter<W>,
    mode: DriveMode,
    cancellation: &CancellationSignal,
) -> Result<SessionOutcome, AppError> {
    let started = Instant::now();
    let mut submitted = matches!(mode, DriveMode::Watch);
    let mut settled: Option<SessionOutcome> = None;

    loop {
        if is_cancelled(Some(cancellation)) {
            info!("interrupted");
            return Ok(settled.unwrap_or(SessionOutcome::Interrupted));
        }

        if let DriveMode::Submit { session_wait, .. } = mode {
            let identified = !runtime.view().session_id().is_empty();
            if !submitted && (identified || started.elapsed() >= session_wait) {
                if !identified {
                    warn!(
                        wait_ms = u64::try_from(session_wait.as_millis()).unwrap_or(u64::MAX),
                        "no session identifier arrived; submitting without one"
                    );
                }
                let changes = runtime.submit()?;
                presenter
                    .present(&changes)
                    .map_err(AppError::io("writing output"))?;
                submitted = true;
            }
        }

        let Ok(event) = timeout(IDLE_POLL, runtime.next_event()).await else {
            continue;
        };
        let Some(event) = event else {
            return Ok(settled.unwrap_or(SessionOutcome::Interrupted));
        };

        let changes = runtime.apply(event);
        presenter
            .present(&changes)
            .map_err(AppError::io("writing output"))?;

        if let Some(outcome) = settled_outcome(&changes) {
            match mode {
                DriveMode::Submit { follow: false, .. } => {
                    drain_trailing(runtime, presenter).await?;
                    return Ok(outcome);
                }
                _ => settled = Some(outcome),
            }
        }
    }
}

/// Print lines that arrive right behind the settle event. Stops once the queue
/// stays idle for one poll interval, or after [`TRAILING_GRACE`].
async fn drain_trailing<W: Write>(
    runtime: &mut UiRuntime,
    presenter: &mut Presenter<W>,
) -> Result<(), AppError> {
    let deadline = Instant::now() + TRAILING_GRACE;
    loop {
        let changes = runtime.flush_pending();
        presenter
            .present(&changes)
            .map_err(AppError::io("writing output"))?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }
        match timeout(IDLE_POLL.min(remaining), runtime.next_event()).await {
            Ok(Some(event)) => {
                let changes = runtime.apply(event);
                presenter
                    .present(&changes)
                    .map_err(AppError::io("writing output"))?;
            }
            Ok(None) | Err(_) => return Ok(()),
        }
    }
}

fn settled_outcome(changes: &[ViewChange]) -> Option<SessionOutcome> {
    changes.iter().find_map(|change| match change {
        ViewChange::ResultShown(_) => Some(SessionOutcome::Completed),
        ViewChange::SubmissionFailed(message) => Some(SessionOutcome::Failed(message.clone())),
        _ => None,
    })
}
