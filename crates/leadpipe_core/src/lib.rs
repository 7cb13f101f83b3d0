//! Leadpipe core: pure run state machine, result records and aggregation.
mod aggregate;
mod effect;
mod msg;
mod poll;
mod query;
mod records;
mod state;
mod update;
mod view_model;

pub use aggregate::{aggregate, CategoryCount, DashboardAggregate};
pub use effect::Effect;
pub use msg::Msg;
pub use poll::{PollResult, RunId};
pub use query::{Query, QueryError};
pub use records::{Category, ForecastRecord, LeadRecord, ResultSet, NO_EMAIL_SENTINEL};
pub use state::{
    Phase, RunState, STATUS_CANCELLED, STATUS_INITIALIZING, STATUS_LOADING_RESULTS, STATUS_READY,
};
pub use update::update;
pub use view_model::{RunSnapshot, RECENT_OPPORTUNITY_LIMIT};
