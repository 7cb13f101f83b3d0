use crate::aggregate::aggregate;
use crate::view_model::RunSnapshot;
use crate::{ForecastRecord, LeadRecord, ResultSet, RunId};

pub const STATUS_INITIALIZING: &str = "Initializing…";
pub const STATUS_LOADING_RESULTS: &str = "Pipeline Finished! Loading data...";
pub const STATUS_READY: &str = "Ready";
pub const STATUS_CANCELLED: &str = "Cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Owned state of one controller. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    phase: Phase,
    status_message: String,
    error_message: Option<String>,
    leads: Vec<LeadRecord>,
    forecast: Vec<ForecastRecord>,
    fetch_warnings: Vec<String>,
    steps_completed: Option<u8>,
    current_run: Option<RunId>,
    last_run_id: RunId,
    fetch_pending: bool,
    dirty: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    pub fn fetch_pending(&self) -> bool {
        self.fetch_pending
    }

    pub fn view(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.current_run,
            phase: self.phase,
            status_message: self.status_message.clone(),
            error_message: self.error_message.clone(),
            aggregate: aggregate(&self.leads, &self.forecast),
            leads: self.leads.clone(),
            forecast: self.forecast.clone(),
            fetch_warnings: self.fetch_warnings.clone(),
            steps_completed: self.steps_completed,
            loading: self.phase == Phase::Running || self.fetch_pending,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current_run(&self, run_id: RunId) -> bool {
        self.current_run == Some(run_id)
    }

    pub(crate) fn begin_run(&mut self) -> RunId {
        self.last_run_id += 1;
        self.current_run = Some(self.last_run_id);
        self.phase = Phase::Running;
        self.status_message = STATUS_INITIALIZING.to_string();
        self.error_message = None;
        self.leads.clear();
        self.forecast.clear();
        self.fetch_warnings.clear();
        self.steps_completed = None;
        self.fetch_pending = false;
        self.dirty = true;
        self.last_run_id
    }

    pub(crate) fn apply_progress(&mut self, message: String, steps_completed: Option<u8>) {
        self.status_message = message;
        if steps_completed.is_some() {
            self.steps_completed = steps_completed;
        }
        self.dirty = true;
    }

    pub(crate) fn complete(&mut self) {
        self.phase = Phase::Completed;
        self.status_message = STATUS_LOADING_RESULTS.to_string();
        self.fetch_pending = true;
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = Phase::Failed;
        self.error_message = Some(message);
        self.dirty = true;
    }

    pub(crate) fn install_results(&mut self, results: ResultSet) {
        self.forecast = results.forecast;
        self.leads = results.leads;
        self.fetch_warnings = results.warnings;
        self.fetch_pending = false;
        self.status_message = STATUS_READY.to_string();
        self.dirty = true;
    }

    pub(crate) fn cancel_polling(&mut self) {
        self.phase = Phase::Idle;
        self.status_message = STATUS_CANCELLED.to_string();
        self.dirty = true;
    }

    pub(crate) fn cancel_fetch(&mut self) {
        self.fetch_pending = false;
        self.status_message = STATUS_CANCELLED.to_string();
        self.dirty = true;
    }
}
