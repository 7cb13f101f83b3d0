//! Job submission and the fixed-cadence status loop.
//!
//! A run is driven by one spawned task that owns the [`JobHandle`] and a
//! single sleep timer. The timer is re-armed only after the previous tick's
//! request has been answered, so at most one status request is in flight.
//! Every await point races the run's [`CancellationToken`], which makes
//! cancellation take effect between ticks and during a pending request alike.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use leadpipe_core::{PollResult, Query};
use pipeline_logging::{pipeline_debug, pipeline_info, pipeline_warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{BackendError, JobHandle, PipelineBackend};

/// User-facing message when the job could not be submitted and the backend gave no detail.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to start pipeline. Is the backend running?";

#[derive(Clone)]
pub struct JobPoller {
    backend: Arc<dyn PipelineBackend>,
    interval: Duration,
}

impl JobPoller {
    pub fn new(backend: Arc<dyn PipelineBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Submits `query` and starts polling. Must be called inside a Tokio runtime.
    ///
    /// The returned stream ends after a terminal result or once `cancel` fires.
    pub fn start(&self, query: Query, cancel: CancellationToken) -> PollStream {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(poll_loop(
            self.backend.clone(),
            self.interval,
            query,
            cancel.clone(),
            tx,
        ));
        PollStream { rx, cancel }
    }
}

/// Results of one run, in the order the ticks observed them.
pub struct PollStream {
    rx: mpsc::UnboundedReceiver<PollResult>,
    cancel: CancellationToken,
}

impl PollStream {
    pub async fn next(&mut self) -> Option<PollResult> {
        self.rx.recv().await
    }

    /// Stops the loop. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for PollStream {
    type Item = PollResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for PollStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    backend: Arc<dyn PipelineBackend>,
    interval: Duration,
    query: Query,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<PollResult>,
) {
    pipeline_info!("Submitting pipeline job query={:?}", query.as_str());
    let submitted = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            pipeline_info!("Run cancelled before submission completed");
            return;
        }
        submitted = backend.submit(&query) => submitted,
    };

    let handle = match submitted {
        Ok(handle) => handle,
        Err(err) => {
            pipeline_warn!("Job submission failed: {}", err);
            let _ = tx.send(PollResult::Failed(submission_message(&err)));
            return;
        }
    };
    pipeline_info!(
        "Job submitted run_id={} interval_ms={}",
        handle.server_run_id().unwrap_or("<ambient>"),
        interval.as_millis()
    );

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        ticks += 1;

        let report = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            report = backend.status(&handle) => report,
        };

        match report {
            Ok(report) => {
                let result = report.into_poll_result();
                pipeline_debug!("Poll tick {} -> {:?}", ticks, result);
                let terminal = result.is_terminal();
                if tx.send(result).is_err() {
                    pipeline_debug!("Poll receiver dropped; stopping loop");
                    break;
                }
                if terminal {
                    pipeline_info!("Job reached a terminal state after {} ticks", ticks);
                    return;
                }
            }
            Err(err) => {
                pipeline_warn!("Poll tick {} failed, retrying next interval: {}", ticks, err);
            }
        }
    }
    pipeline_info!("Poll loop stopped after {} ticks", ticks);
}

fn submission_message(err: &BackendError) -> String {
    err.detail
        .clone()
        .unwrap_or_else(|| SUBMIT_FAILED_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;

    #[test]
    fn submission_message_prefers_backend_detail() {
        let plain = BackendError::new(FailureKind::Network, "connection refused");
        assert_eq!(submission_message(&plain), SUBMIT_FAILED_MESSAGE);

        let detailed = BackendError::new(FailureKind::HttpStatus(400), "400 Bad Request")
            .with_detail(Some("Pipeline is already running".to_string()));
        assert_eq!(submission_message(&detailed), "Pipeline is already running");
    }
}
