use crate::{PollResult, Query, ResultSet, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller asked for a new run with a validated query.
    StartRequested(Query),
    /// The poller produced an outcome for a run.
    PollReported { run_id: RunId, result: PollResult },
    /// Both result collections were retrieved (possibly partially) for a run.
    ResultsFetched { run_id: RunId, results: ResultSet },
    /// Caller asked to stop whatever is in flight.
    CancelRequested,
}
