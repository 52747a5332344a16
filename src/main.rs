use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use sheed::cli::Cli;
use sheed::logging::init_logging;
use sheed::present::Presenter;
use sheed::{drive, AppConfig, AppError, DriveMode, RunMode, SessionOutcome, UiRuntime};
use sheed_api::{CancellationSignal, LogChannel, SheedApiClient, WebSocketTransport};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{debug, error};

const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            error!(%error, "sheed failed");
            eprintln!("sheed: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = AppConfig::from_cli(&cli)?;

    if config.mode == RunMode::DryRun {
        let request = config.form.to_job_request("");
        let body = serde_json::to_string_pretty(&request).map_err(AppError::Encode)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "POST {}", sheed_api::submit_url(&config.origin))
            .and_then(|()| writeln!(stdout, "{body}"))
            .map_err(AppError::io("writing dry run"))?;
        return Ok(ExitCode::SUCCESS);
    }

    init_logging(&config.log)?;
    let cancellation = install_signal_handlers()?;

    let client = SheedApiClient::new(config.api.clone())?;
    let mut runtime = UiRuntime::new(
        client.origin().clone(),
        config.form.clone(),
        Arc::new(client),
    );

    let channel = LogChannel::from_config(&config.api)?;
    let channel_task = tokio::spawn({
        let cancellation = Arc::clone(&cancellation);
        let sink = runtime.sender().channel_sink();
        async move {
            let mut transport = WebSocketTransport;
            channel.run(&mut transport, Some(&cancellation), sink).await
        }
    });

    let mode = match config.mode {
        RunMode::Submit { follow } => DriveMode::Submit {
            follow,
            session_wait: config.session_wait,
        },
        RunMode::Watch | RunMode::DryRun => DriveMode::Watch,
    };
    let mut presenter = Presenter::new(io::stdout());
    let outcome = drive(&mut runtime, &mut presenter, mode, &cancellation).await;

    cancellation.store(true, Ordering::Release);
    match channel_task.await {
        Ok(exit) => debug!(?exit, "channel stopped"),
        Err(join_error) => debug!(%join_error, "channel task ended abnormally"),
    }

    Ok(match outcome? {
        SessionOutcome::Completed => ExitCode::SUCCESS,
        SessionOutcome::Failed(_) => ExitCode::FAILURE,
        SessionOutcome::Interrupted => ExitCode::from(EXIT_INTERRUPTED),
    })
}

fn install_signal_handlers() -> Result<CancellationSignal, AppError> {
    let cancellation = Arc::new(AtomicBool::new(false));
    for (signal, name) in [(SIGINT, "SIGINT"), (SIGTERM, "SIGTERM")] {
        signal_hook::flag::register(signal, Arc::clone(&cancellation))
            .map_err(|source| AppError::Signal {
                signal: name,
                source,
            })?;
    }
    Ok(cancellation)
}
