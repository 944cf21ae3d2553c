//! # Models
//!
//! Records exchanged with the host catalog and the spatial ingestor service.

pub mod context;
pub mod job;
pub mod resource;
pub mod task_status;

pub use context::RequestContext;
pub use job::{JobReference, JobType, TaskError};
pub use resource::{Activity, Organization, Package, Resource, User};
pub use task_status::TaskStatus;
