use std::sync::Arc;

use leadpipe_core::ResultSet;
use pipeline_logging::{pipeline_info, pipeline_warn};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{BackendError, PipelineBackend};

/// Retrieves both result collections of a finished run.
#[derive(Clone)]
pub struct ResultFetcher {
    backend: Arc<dyn PipelineBackend>,
}

impl ResultFetcher {
    pub fn new(backend: Arc<dyn PipelineBackend>) -> Self {
        Self { backend }
    }

    /// Requests forecast and leads concurrently and waits for both.
    ///
    /// A failed collection is logged and comes back empty, with a warning
    /// recorded in the returned set.
    pub async fn fetch(&self) -> ResultSet {
        let (forecast, leads) = tokio::join!(self.backend.forecast(), self.backend.leads());

        let mut warnings = Vec::new();
        let forecast = settle("forecast", forecast, &mut warnings);
        let leads = settle("leads", leads, &mut warnings);
        pipeline_info!(
            "Fetched results forecast={} leads={} failures={}",
            forecast.len(),
            leads.len(),
            warnings.len()
        );

        ResultSet {
            forecast,
            leads,
            warnings,
        }
    }

    /// Runs [`ResultFetcher::fetch`] on its own task. Must be called inside a Tokio runtime.
    ///
    /// The requests are sent once, however often the returned handle is
    /// polled or dropped mid-wait.
    pub fn spawn(&self, cancel: CancellationToken) -> PendingResults {
        let (tx, rx) = oneshot::channel();
        let fetcher = self.clone();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => pipeline_info!("Result fetch cancelled"),
                results = fetcher.fetch() => {
                    let _ = tx.send(results);
                }
            }
        });
        PendingResults { rx, cancel }
    }
}

/// Handle to a fetch started by [`ResultFetcher::spawn`].
pub struct PendingResults {
    rx: oneshot::Receiver<ResultSet>,
    cancel: CancellationToken,
}

impl PendingResults {
    /// Waits for the results. Cancel-safe.
    ///
    /// `None` when the fetch task ended without delivering anything. Must not
    /// be awaited again after it has returned.
    pub async fn wait(&mut self) -> Option<ResultSet> {
        (&mut self.rx).await.ok()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PendingResults {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn settle<T>(
    collection: &str,
    result: Result<Vec<T>, BackendError>,
    warnings: &mut Vec<String>,
) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(err) => {
            pipeline_warn!("Failed to fetch {}: {}", collection, err);
            warnings.push(format!("{collection}: {err}"));
            Vec::new()
        }
    }
}
