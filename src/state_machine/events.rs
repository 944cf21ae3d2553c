use super::states::TaskState;

/// Events that move a task status record through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// A submission cycle starts (first attempt or resubmission)
    BeginSubmission,
    /// The microservice accepted the job
    Accepted,
    /// Transport failure or remote rejection while submitting
    SubmissionFailed,
    /// The microservice called back with a status
    CallbackReceived(TaskState),
}

impl TaskEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BeginSubmission => "begin_submission",
            Self::Accepted => "accepted",
            Self::SubmissionFailed => "submission_failed",
            Self::CallbackReceived(_) => "callback_received",
        }
    }
}

/// Outcome of applying an event to the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: TaskState,
    /// False when the event arrived in a state the lifecycle does not expect.
    /// The transition is still applied: the store record is the source of truth.
    pub expected: bool,
}

/// Compute the next state for `event` starting at `from` (`None` is the implicit `none` state)
pub fn next_state(from: Option<&TaskState>, event: &TaskEvent) -> Transition {
    let (to, expected) = match event {
        // A new cycle may supersede any previous record
        TaskEvent::BeginSubmission => (TaskState::Submitting, true),
        TaskEvent::Accepted => (
            TaskState::Pending,
            matches!(from, Some(TaskState::Submitting)),
        ),
        TaskEvent::SubmissionFailed => (
            TaskState::Error,
            matches!(from, Some(TaskState::Submitting)),
        ),
        TaskEvent::CallbackReceived(status) => (
            status.clone(),
            matches!(
                from,
                Some(TaskState::Pending | TaskState::Submitting | TaskState::Other(_))
            ),
        ),
    };
    Transition { to, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let t = next_state(None, &TaskEvent::BeginSubmission);
        assert_eq!(t.to, TaskState::Submitting);
        let t = next_state(Some(&t.to), &TaskEvent::Accepted);
        assert_eq!(t, Transition { to: TaskState::Pending, expected: true });
        let t = next_state(
            Some(&t.to),
            &TaskEvent::CallbackReceived(TaskState::Complete),
        );
        assert_eq!(t, Transition { to: TaskState::Complete, expected: true });
    }

    #[test]
    fn test_resubmission_loop_from_complete() {
        let t = next_state(Some(&TaskState::Complete), &TaskEvent::BeginSubmission);
        assert_eq!(t, Transition { to: TaskState::Submitting, expected: true });
    }

    #[test]
    fn test_late_callback_is_flagged_unexpected() {
        let t = next_state(
            Some(&TaskState::Complete),
            &TaskEvent::CallbackReceived(TaskState::Error),
        );
        assert_eq!(t.to, TaskState::Error);
        assert!(!t.expected);
    }
}
