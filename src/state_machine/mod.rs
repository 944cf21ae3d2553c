// Task status lifecycle
//
// none -> submitting -> pending -> {complete, error}; complete and error
// restart at submitting when a new submission cycle begins.

pub mod events;
pub mod states;

pub use events::{next_state, TaskEvent, Transition};
pub use states::{status_description, TaskState};
