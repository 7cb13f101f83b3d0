use std::fmt;

use leadpipe_core::PollResult;
use serde::Deserialize;
use thiserror::Error;

/// Reference to a submitted job.
///
/// The current backend tracks a single ambient job, so most handles carry no
/// id. When the backend does return a `run_id`, status requests are scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobHandle {
    server_run_id: Option<String>,
}

impl JobHandle {
    pub fn ambient() -> Self {
        Self::default()
    }

    pub fn with_server_id(id: impl Into<String>) -> Self {
        Self {
            server_run_id: Some(id.into()),
        }
    }

    pub fn server_run_id(&self) -> Option<&str> {
        self.server_run_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Error,
    #[serde(other)]
    Unrecognized,
}

/// Body of `GET /api/pipeline/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: JobStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub steps_completed: Option<u8>,
}

impl StatusReport {
    pub fn running(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Running,
            message: message.into(),
            steps_completed: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: JobStatus::Completed,
            message: "Pipeline finished successfully".to_string(),
            steps_completed: Some(6),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            message: message.into(),
            steps_completed: None,
        }
    }

    /// Anything that is neither finished nor failed keeps the loop going.
    pub fn into_poll_result(self) -> PollResult {
        match self.status {
            JobStatus::Completed => PollResult::Completed,
            JobStatus::Error => PollResult::Failed(self.message),
            JobStatus::Idle | JobStatus::Running | JobStatus::Unrecognized => PollResult::Running {
                message: self.message,
                steps_completed: self.steps_completed,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
    /// `detail` field of a JSON error body, when the backend sent one.
    pub detail: Option<String>,
}

impl BackendError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}
