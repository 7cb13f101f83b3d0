use std::time::Duration;

use leadpipe_core::Phase;
use leadpipe_engine::{ClientSettings, PipelineController};
use pipeline_logging::{pipeline_info, pipeline_warn};
use tokio_util::sync::CancellationToken;

use super::render;
use crate::cli::{Commands, RunArgs};

/// Executes a CLI command. Returns `false` when the run ended in failure.
pub async fn run(command: Commands) -> anyhow::Result<bool> {
    match command {
        Commands::Run(args) => run_pipeline(args).await,
    }
}

async fn run_pipeline(args: RunArgs) -> anyhow::Result<bool> {
    let settings = build_settings(&args)?;
    pipeline_info!(
        "Using backend {} with poll interval {}ms",
        settings.base_url,
        settings.poll_interval.as_millis()
    );

    let session = CancellationToken::new();
    let mut controller = PipelineController::from_settings(&settings, &session)?;
    let mut snapshots = controller.subscribe();

    let interrupt = session.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                pipeline_info!("Interrupt received; cancelling run");
                interrupt.cancel();
            }
            Err(err) => pipeline_warn!("Could not listen for Ctrl-C: {}", err),
        }
    });

    controller.start(&args.query_text())?;
    let mut last_status = render::status_line(&snapshots.borrow_and_update());
    println!("{last_status}");

    loop {
        let more = controller.step().await;
        if snapshots.has_changed().unwrap_or(false) {
            let snapshot = snapshots.borrow_and_update().clone();
            let line = render::status_line(&snapshot);
            if line != last_status {
                println!("{line}");
                last_status = line;
            }
        }
        if !more {
            break;
        }
    }

    let snapshot = controller.snapshot();
    print!("{}", render::render(&snapshot, args.view));
    Ok(snapshot.phase != Phase::Failed)
}

fn build_settings(args: &RunArgs) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::from_env()?;
    if let Some(url) = &args.api_url {
        settings = settings.with_base_url(url)?;
    }
    if let Some(millis) = args.interval_ms {
        settings = settings.with_poll_interval(Duration::from_millis(millis))?;
    }
    Ok(settings)
}
