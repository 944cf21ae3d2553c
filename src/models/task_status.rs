use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{TASK_ENTITY_TYPE, TASK_KEY};
use crate::error::Result;
use crate::models::job::{JobReference, JobType, TaskError};
use crate::state_machine::{next_state, TaskEvent, TaskState};

/// Host-owned task status record, unique per (entity_id, task_type, key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Store identifier; `None` until the store assigns one
    #[serde(default)]
    pub id: Option<String>,
    pub entity_id: String,
    pub entity_type: String,
    pub task_type: JobType,
    pub key: String,
    pub state: TaskState,
    /// Opaque JSON text, `{job_id, job_key}` once the job is accepted
    pub value: String,
    /// Opaque JSON text describing the last failure, `{}` otherwise
    pub error: String,
    pub last_updated: DateTime<Utc>,
}

impl TaskStatus {
    /// Fresh record in the `submitting` state
    pub fn submitting(entity_id: impl Into<String>, task_type: JobType) -> Self {
        Self {
            id: None,
            entity_id: entity_id.into(),
            entity_type: TASK_ENTITY_TYPE.to_string(),
            task_type,
            key: TASK_KEY.to_string(),
            state: TaskState::Submitting,
            value: "{}".to_string(),
            error: "{}".to_string(),
            last_updated: Utc::now(),
        }
    }

    /// Start a new submission cycle, keeping the store identifier
    pub fn restart(&mut self) {
        self.apply(TaskEvent::BeginSubmission);
        self.value = "{}".to_string();
        self.error = "{}".to_string();
    }

    /// Record the accepted job and move to `pending`
    pub fn accept(&mut self, job: &JobReference) -> Result<()> {
        self.value = serde_json::to_string(job)?;
        self.apply(TaskEvent::Accepted);
        Ok(())
    }

    /// Record a failed submission and move to `error`
    pub fn fail(&mut self, error: &TaskError) -> Result<()> {
        self.error = serde_json::to_string(error)?;
        self.apply(TaskEvent::SubmissionFailed);
        Ok(())
    }

    /// Apply a lifecycle event, always advancing `last_updated`.
    ///
    /// Returns whether the transition was one the lifecycle expects.
    pub fn apply(&mut self, event: TaskEvent) -> bool {
        let transition = next_state(Some(&self.state), &event);
        if !transition.expected {
            tracing::warn!(
                entity_id = %self.entity_id,
                task_type = %self.task_type,
                from = %self.state,
                to = %transition.to,
                event = event.event_type(),
                "Unexpected task status transition"
            );
        }
        self.state = transition.to;
        self.touch();
        transition.expected
    }

    /// Advance `last_updated`, strictly later than the previous value
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.last_updated = if now > self.last_updated {
            now
        } else {
            self.last_updated + Duration::microseconds(1)
        };
    }

    /// Job reference stored in `value`, if the job was accepted
    pub fn job_reference(&self) -> Option<JobReference> {
        serde_json::from_str(&self.value).ok()
    }

    /// `value` as JSON, `{}` when it cannot be parsed
    pub fn value_json(&self) -> Value {
        serde_json::from_str(&self.value).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    /// `error` as JSON, `{}` when it cannot be parsed
    pub fn error_json(&self) -> Value {
        serde_json::from_str(&self.error).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_cycle() {
        let mut task = TaskStatus::submitting("r1", JobType::SpatialIngest);
        assert_eq!(task.state, TaskState::Submitting);
        assert_eq!(task.job_reference(), None);

        let before = task.last_updated;
        task.accept(&JobReference {
            job_id: "j1".to_string(),
            job_key: "k1".to_string(),
        })
        .unwrap();
        assert_eq!(task.state, TaskState::Pending);
        assert!(task.last_updated > before);
        assert_eq!(task.job_reference().unwrap().job_id, "j1");
    }

    #[test]
    fn test_restart_clears_previous_cycle() {
        let mut task = TaskStatus::submitting("r1", JobType::SpatialIngest);
        task.id = Some("t1".to_string());
        task.fail(&TaskError {
            message: "Could not connect to Spatial Ingestor.".to_string(),
            details: Value::String("refused".to_string()),
            status_code: None,
        })
        .unwrap();
        assert_eq!(task.state, TaskState::Error);
        assert_eq!(task.error_json()["details"], "refused");

        task.restart();
        assert_eq!(task.state, TaskState::Submitting);
        assert_eq!(task.error, "{}");
        assert_eq!(task.id.as_deref(), Some("t1"));
    }
}
