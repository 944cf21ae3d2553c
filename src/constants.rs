//! # System Constants
//!
//! Names shared with the host catalog and the spatial ingestor microservice.

/// `key` column of every task status record owned by this extension
pub const TASK_KEY: &str = "spatialingestor";

/// `entity_type` recorded on task status rows
pub const TASK_ENTITY_TYPE: &str = "resource";

/// Catalog action the microservice calls back into
pub const CALLBACK_PATH: &str = "/api/3/action/spatialingestor_hook";

/// Relative path of the job endpoint on the microservice
pub const JOB_ENDPOINT: &str = "job";

/// Inline detail reported when a live status lookup fails
pub const STATUS_UNREACHABLE: &str = "cannot connect to spatialingestor";

/// Lifecycle events published on the [`EventPublisher`](crate::events::EventPublisher)
pub mod events {
    pub const JOB_SUBMITTING: &str = "job.submitting";
    pub const JOB_SUBMITTED: &str = "job.submitted";
    pub const JOB_SUBMISSION_FAILED: &str = "job.submission_failed";
    pub const JOB_CALLBACK_APPLIED: &str = "job.callback_applied";
    pub const JOB_CALLBACK_IGNORED: &str = "job.callback_ignored";
    pub const JOB_RESUBMITTED: &str = "job.resubmitted";

    pub const INGEST_SKIPPED: &str = "ingest.skipped";
    pub const INGEST_FLAGGED_PARENT: &str = "ingest.flagged_parent";

    pub const PURGE_CHILD_DELETED: &str = "purge.child_deleted";
    pub const PURGE_CHILD_DELETE_FAILED: &str = "purge.child_delete_failed";
}
