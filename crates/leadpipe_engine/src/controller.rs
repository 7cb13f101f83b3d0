use std::sync::Arc;
use std::time::Duration;

use leadpipe_core::{
    update, Effect, Msg, Phase, PollResult, Query, QueryError, ResultSet, RunId, RunSnapshot,
    RunState,
};
use pipeline_logging::{pipeline_info, pipeline_warn};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    BackendError, ClientSettings, JobPoller, PendingResults, PipelineBackend, PollStream,
    ReqwestBackend, ResultFetcher,
};

/// Error shown when the poll loop stops without reporting a final status.
pub const POLL_LOST_MESSAGE: &str = "Lost track of the pipeline job; polling stopped unexpectedly.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    #[error("a pipeline run is already in progress")]
    AlreadyRunning,
}

struct ActiveRun {
    run_id: RunId,
    stream: PollStream,
}

struct PendingFetch {
    run_id: RunId,
    results: PendingResults,
}

enum Wake {
    SessionEnded,
    Poll(Option<PollResult>),
    Fetched(Option<ResultSet>),
}

/// Owns the run state and drives poller, fetcher and aggregation for it.
///
/// Presentation reads [`RunSnapshot`]s through [`PipelineController::snapshot`]
/// or a [`PipelineController::subscribe`] receiver; a new snapshot is
/// published after every state change.
pub struct PipelineController {
    state: RunState,
    poller: JobPoller,
    fetcher: ResultFetcher,
    session: CancellationToken,
    active: Option<ActiveRun>,
    pending_fetch: Option<PendingFetch>,
    snapshot_tx: watch::Sender<RunSnapshot>,
}

impl PipelineController {
    pub fn new(backend: Arc<dyn PipelineBackend>, poll_interval: Duration) -> Self {
        Self::with_session(backend, poll_interval, &CancellationToken::new())
    }

    /// Ties every run to `session`: cancelling it stops polling and fetching.
    pub fn with_session(
        backend: Arc<dyn PipelineBackend>,
        poll_interval: Duration,
        session: &CancellationToken,
    ) -> Self {
        let state = RunState::new();
        let (snapshot_tx, _) = watch::channel(state.view());
        Self {
            state,
            poller: JobPoller::new(backend.clone(), poll_interval),
            fetcher: ResultFetcher::new(backend),
            session: session.child_token(),
            active: None,
            pending_fetch: None,
            snapshot_tx,
        }
    }

    pub fn from_settings(
        settings: &ClientSettings,
        session: &CancellationToken,
    ) -> Result<Self, BackendError> {
        let backend = ReqwestBackend::new(settings.clone())?;
        Ok(Self::with_session(
            Arc::new(backend),
            settings.poll_interval,
            session,
        ))
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Begins a new run. Rejected while another run is polling.
    pub fn start(&mut self, query: &str) -> Result<RunId, StartError> {
        let query = Query::new(query)?;
        if self.state.phase() == Phase::Running {
            return Err(StartError::AlreadyRunning);
        }
        self.dispatch(Msg::StartRequested(query));
        self.state.current_run().ok_or(StartError::AlreadyRunning)
    }

    /// Stops polling or abandons the result fetch of the current run.
    pub fn cancel(&mut self) {
        self.dispatch(Msg::CancelRequested);
    }

    /// True while a poll loop or a result fetch still needs driving.
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || self.pending_fetch.is_some()
    }

    /// Waits for the next event of the current run and applies it.
    ///
    /// Returns `false` once there is nothing left to drive.
    pub async fn step(&mut self) -> bool {
        if self.session.is_cancelled() {
            self.end_session();
            return false;
        }

        let wake = if let Some(fetch) = self.pending_fetch.as_mut() {
            tokio::select! {
                biased;
                _ = self.session.cancelled() => Wake::SessionEnded,
                results = fetch.results.wait() => Wake::Fetched(results),
            }
        } else if let Some(active) = self.active.as_mut() {
            tokio::select! {
                biased;
                _ = self.session.cancelled() => Wake::SessionEnded,
                next = active.stream.next() => Wake::Poll(next),
            }
        } else {
            return false;
        };

        match wake {
            Wake::SessionEnded => {
                self.end_session();
                return false;
            }
            Wake::Fetched(results) => {
                if let Some(fetch) = self.pending_fetch.take() {
                    let results = results.unwrap_or_else(|| {
                        pipeline_warn!(
                            "Result fetch for run {} ended without results",
                            fetch.run_id
                        );
                        ResultSet {
                            warnings: vec!["results: fetch ended unexpectedly".to_string()],
                            ..ResultSet::default()
                        }
                    });
                    self.dispatch(Msg::ResultsFetched {
                        run_id: fetch.run_id,
                        results,
                    });
                }
            }
            Wake::Poll(Some(result)) => {
                if let Some(run_id) = self.active.as_ref().map(|run| run.run_id) {
                    if result.is_terminal() {
                        self.active = None;
                    }
                    self.dispatch(Msg::PollReported { run_id, result });
                }
            }
            Wake::Poll(None) => {
                if let Some(run) = self.active.take() {
                    pipeline_warn!(
                        "Poll stream for run {} closed without a final status",
                        run.run_id
                    );
                    self.dispatch(Msg::PollReported {
                        run_id: run.run_id,
                        result: PollResult::Failed(POLL_LOST_MESSAGE.to_string()),
                    });
                }
            }
        }
        true
    }

    /// Drives the current run until it settles and returns the final snapshot.
    pub async fn run_to_end(&mut self) -> RunSnapshot {
        while self.step().await {}
        self.snapshot()
    }

    fn end_session(&mut self) {
        if self.is_busy() {
            pipeline_info!("Session cancelled; stopping current run");
            self.dispatch(Msg::CancelRequested);
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.apply(effect);
        }
        self.publish();
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartJob { run_id, query } => {
                pipeline_info!("Starting run {} query={:?}", run_id, query.as_str());
                let stream = self.poller.start(query, self.session.child_token());
                if let Some(previous) = self.active.replace(ActiveRun { run_id, stream }) {
                    previous.stream.cancel();
                }
            }
            Effect::FetchResults { run_id } => {
                pipeline_info!("Run {} completed; fetching results", run_id);
                let results = self.fetcher.spawn(self.session.child_token());
                let pending = PendingFetch { run_id, results };
                if let Some(previous) = self.pending_fetch.replace(pending) {
                    previous.results.cancel();
                }
            }
            Effect::StopPolling { run_id } => {
                if self.active.as_ref().is_some_and(|run| run.run_id == run_id) {
                    if let Some(run) = self.active.take() {
                        run.stream.cancel();
                    }
                    pipeline_info!("Run {} cancelled while polling", run_id);
                }
            }
            Effect::AbandonFetch { run_id } => {
                if self
                    .pending_fetch
                    .as_ref()
                    .is_some_and(|fetch| fetch.run_id == run_id)
                {
                    if let Some(fetch) = self.pending_fetch.take() {
                        fetch.results.cancel();
                    }
                    pipeline_info!("Run {} result fetch abandoned", run_id);
                }
            }
        }
    }

    fn publish(&mut self) {
        if self.state.consume_dirty() {
            self.snapshot_tx.send_replace(self.state.view());
        }
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.session.cancel();
    }
}
