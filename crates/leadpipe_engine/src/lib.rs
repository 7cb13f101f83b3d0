//! Leadpipe engine: backend access, job polling and run orchestration.
mod backend;
mod controller;
mod fetcher;
mod poller;
mod settings;
mod types;

pub use backend::{PipelineBackend, ReqwestBackend};
pub use controller::{PipelineController, StartError, POLL_LOST_MESSAGE};
pub use fetcher::{PendingResults, ResultFetcher};
pub use poller::{JobPoller, PollStream, SUBMIT_FAILED_MESSAGE};
pub use settings::{
    ClientSettings, SettingsError, API_URL_ENV, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL,
    POLL_INTERVAL_ENV,
};
pub use types::{BackendError, FailureKind, JobHandle, JobStatus, StatusReport};
