use crate::{DashboardAggregate, ForecastRecord, LeadRecord, Phase, RunId};

/// Number of forecast rows shown as "recent opportunities" on the dashboard.
pub const RECENT_OPPORTUNITY_LIMIT: usize = 5;

/// Immutable copy of the run state handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSnapshot {
    pub run_id: Option<RunId>,
    pub phase: Phase,
    pub status_message: String,
    pub error_message: Option<String>,
    pub leads: Vec<LeadRecord>,
    pub forecast: Vec<ForecastRecord>,
    pub aggregate: DashboardAggregate,
    pub fetch_warnings: Vec<String>,
    pub steps_completed: Option<u8>,
    pub loading: bool,
}

impl RunSnapshot {
    pub fn has_data(&self) -> bool {
        !self.leads.is_empty() || !self.forecast.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn recent_opportunities(&self, limit: usize) -> &[ForecastRecord] {
        &self.forecast[..self.forecast.len().min(limit)]
    }
}
