use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a spatial ingestor task status record
///
/// A missing record is the implicit `none` state. The microservice may report
/// states this side does not know about; those are carried verbatim in
/// [`TaskState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    /// Submission in flight, written before the network call
    Submitting,
    /// The microservice accepted the job
    Pending,
    /// The microservice reported completion
    Complete,
    /// Submission or processing failed
    Error,
    /// Any other status reported by the microservice
    Other(String),
}

impl TaskState {
    /// A job for this record is in flight or waiting on the microservice
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitting | Self::Pending)
    }

    /// No further transition happens without a new external trigger
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitting => "submitting",
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Human readable caption for the state
    pub fn caption(&self) -> String {
        match self {
            Self::Submitting => "Submitting".to_string(),
            Self::Pending => "Pending".to_string(),
            Self::Complete => "Complete".to_string(),
            Self::Error => "Error".to_string(),
            Self::Other(s) => capitalize(s),
        }
    }
}

/// Caption for an optional status, `None` meaning the resource was never submitted
pub fn status_description(state: Option<&TaskState>) -> String {
    match state {
        Some(state) if !state.as_str().is_empty() => state.caption(),
        _ => "Not Uploaded Yet".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        match s {
            "submitting" => Self::Submitting,
            "pending" => Self::Pending,
            "complete" => Self::Complete,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        state.as_str().to_string()
    }
}

impl std::str::FromStr for TaskState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
