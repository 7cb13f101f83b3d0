#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use leadpipe_core::{Category, ForecastRecord, LeadRecord, Query};
use leadpipe_engine::{BackendError, FailureKind, JobHandle, PipelineBackend, StatusReport};
use tokio::time::Instant;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pipeline_logging::initialize_for_tests);
}

pub fn network_error() -> BackendError {
    BackendError::new(FailureKind::Network, "connection reset")
}

pub fn sample_leads() -> Vec<LeadRecord> {
    vec![
        LeadRecord::new("a.com", "x@a.com"),
        LeadRecord::new("b.com", "N/A"),
    ]
}

pub fn sample_forecast() -> Vec<ForecastRecord> {
    vec![
        ForecastRecord::new("x@a.com", Category::Hot, "Replied positively"),
        ForecastRecord::new("y@c.com", Category::Hot, "Booked a call"),
        ForecastRecord::new("z@d.com", Category::Warm, "Asked for pricing"),
    ]
}

/// In-memory backend that replays scripted status reports.
///
/// Once the script is exhausted every further tick reports "running".
pub struct ScriptedBackend {
    submit: Mutex<Result<JobHandle, BackendError>>,
    statuses: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
    forecast: Mutex<Result<Vec<ForecastRecord>, BackendError>>,
    leads: Mutex<Result<Vec<LeadRecord>, BackendError>>,
    status_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
    pub submitted_queries: Mutex<Vec<String>>,
    pub status_times: Mutex<Vec<Instant>>,
    pub status_handles: Mutex<Vec<JobHandle>>,
    pub submit_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub forecast_calls: AtomicUsize,
    pub leads_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(statuses: Vec<Result<StatusReport, BackendError>>) -> Self {
        Self {
            submit: Mutex::new(Ok(JobHandle::ambient())),
            statuses: Mutex::new(statuses.into()),
            forecast: Mutex::new(Ok(sample_forecast())),
            leads: Mutex::new(Ok(sample_leads())),
            status_delay: None,
            fetch_delay: None,
            submitted_queries: Mutex::new(Vec::new()),
            status_times: Mutex::new(Vec::new()),
            status_handles: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
            leads_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_submit(self, result: Result<JobHandle, BackendError>) -> Self {
        *self.submit.lock().unwrap() = result;
        self
    }

    pub fn with_forecast(self, result: Result<Vec<ForecastRecord>, BackendError>) -> Self {
        *self.forecast.lock().unwrap() = result;
        self
    }

    pub fn with_leads(self, result: Result<Vec<LeadRecord>, BackendError>) -> Self {
        *self.leads.lock().unwrap() = result;
        self
    }

    /// Every status request takes `delay` before answering.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    /// Every data request takes `delay` before answering.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn push_status(&self, status: Result<StatusReport, BackendError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_count(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn leads_count(&self) -> usize {
        self.leads_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PipelineBackend for ScriptedBackend {
    async fn submit(&self, query: &Query) -> Result<JobHandle, BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_queries
            .lock()
            .unwrap()
            .push(query.as_str().to_string());
        self.submit.lock().unwrap().clone()
    }

    async fn status(&self, handle: &JobHandle) -> Result<StatusReport, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_times.lock().unwrap().push(Instant::now());
        self.status_handles.lock().unwrap().push(handle.clone());
        pause(self.status_delay).await;
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::running("Scoring leads...")))
    }

    async fn forecast(&self) -> Result<Vec<ForecastRecord>, BackendError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.fetch_delay).await;
        self.forecast.lock().unwrap().clone()
    }

    async fn leads(&self) -> Result<Vec<LeadRecord>, BackendError> {
        self.leads_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.fetch_delay).await;
        self.leads.lock().unwrap().clone()
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

/// Backend whose status endpoint panics, taking the poll task down with it.
pub struct PanickingStatusBackend;

#[async_trait::async_trait]
impl PipelineBackend for PanickingStatusBackend {
    async fn submit(&self, _query: &Query) -> Result<JobHandle, BackendError> {
        Ok(JobHandle::ambient())
    }

    async fn status(&self, _handle: &JobHandle) -> Result<StatusReport, BackendError> {
        panic!("status handler blew up");
    }

    async fn forecast(&self) -> Result<Vec<ForecastRecord>, BackendError> {
        Ok(Vec::new())
    }

    async fn leads(&self) -> Result<Vec<LeadRecord>, BackendError> {
        Ok(Vec::new())
    }
}
