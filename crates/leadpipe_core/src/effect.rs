use crate::{Query, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit the job and begin polling its status.
    StartJob { run_id: RunId, query: Query },
    /// Retrieve the forecast and lead collections concurrently.
    FetchResults { run_id: RunId },
    /// Disarm the poll loop of a run.
    StopPolling { run_id: RunId },
    /// Drop an outstanding result fetch.
    AbandonFetch { run_id: RunId },
}
