/// Local, monotonically increasing run number assigned by [`crate::RunState`].
pub type RunId = u64;

/// Outcome of one poll tick (or of the submission itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    Running {
        message: String,
        steps_completed: Option<u8>,
    },
    Completed,
    Failed(String),
}

impl PollResult {
    pub fn running(message: impl Into<String>) -> Self {
        Self::Running {
            message: message.into(),
            steps_completed: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}
