//! # Orchestration
//!
//! Job lifecycle for the spatial ingestor microservice.
//!
//! ## Core Components
//!
//! - **AdmissionFilter**: decides whether a resource is a spatial ingest candidate
//! - **JobSubmitter**: posts jobs and keeps the task status record in step
//! - **CallbackHandler**: applies status callbacks, resubmitting stale resources
//! - **StatusPoller**: merges the stored record with live job detail
//! - **PurgeCoordinator**: removes remote artifacts and child resources of a parent
//! - **IngestTrigger** / **EventDispatcher**: react to catalog lifecycle events
//! - **BulkMaintenance**: operator-driven purge and re-ingest
//! - **SpatialIngestor**: wires all of the above

pub mod admission;
pub mod bootstrap;
pub mod bulk;
pub mod callback_handler;
pub mod dispatcher;
pub mod ingest_trigger;
pub mod job_submitter;
pub mod purge_coordinator;
pub mod status_poller;
pub mod submission_lock;
pub mod types;

pub use admission::{AdmissionFilter, BlacklistMatch, SpatialFormat};
pub use bootstrap::{Collaborators, SpatialIngestor, SystemStatus};
pub use bulk::{BulkFailure, BulkMaintenance, BulkReport};
pub use callback_handler::{
    needs_resubmission, parse_timestamp, CallbackHandler, CallbackOutcome, CallbackPayload,
};
pub use dispatcher::{DispatchOutcome, EventDispatcher, ResourceEvent};
pub use ingest_trigger::{IngestOutcome, IngestTrigger};
pub use job_submitter::{ingest_request, JobSubmitter};
pub use purge_coordinator::{PurgeCoordinator, PurgeReport};
pub use status_poller::{JobStatusReport, StatusPoller};
pub use submission_lock::{SubmissionGuard, SubmissionLocks};
pub use types::{SubmitOutcome, SubmitRequest};
