//! Request and outcome types shared by the orchestration components.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SpatialIngestorError};
use crate::models::{JobReference, JobType, Resource};
use crate::state_machine::TaskState;

/// A job submission for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub resource_id: String,
    pub job_type: JobType,
    /// Owning package name, required for `spatial_purge`
    #[serde(default)]
    pub package_name: Option<String>,
    /// Caller-supplied metadata merged into the job request
    #[serde(default)]
    pub extra_metadata: Map<String, Value>,
    /// Snapshot used instead of a catalog read, for resources the host may
    /// already have removed (purge on delete)
    #[serde(skip)]
    pub resource: Option<Resource>,
}

impl SubmitRequest {
    pub fn new(resource_id: impl Into<String>, job_type: JobType) -> Self {
        Self {
            resource_id: resource_id.into(),
            job_type,
            package_name: None,
            extra_metadata: Map::new(),
            resource: None,
        }
    }

    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_metadata.insert(key.into(), value);
        self
    }

    /// Reject malformed input before any side effect
    pub fn validate(&self) -> Result<()> {
        if self.resource_id.trim().is_empty() {
            return Err(SpatialIngestorError::validation("Missing value: resource_id"));
        }
        if self.job_type == JobType::SpatialPurge
            && self
                .package_name
                .as_deref()
                .map_or(true, |name| name.trim().is_empty())
        {
            return Err(SpatialIngestorError::validation(
                "Missing value: package_name",
            ));
        }
        Ok(())
    }
}

/// What a submission attempt ended with, when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The microservice accepted the job; the task is `pending`
    Submitted(JobReference),
    /// The resource no longer exists in the catalog
    ResourceMissing,
    /// An idle-only submission found a job already in flight
    AlreadyInFlight(TaskState),
}

impl SubmitOutcome {
    pub fn job(&self) -> Option<&JobReference> {
        match self {
            Self::Submitted(job) => Some(job),
            _ => None,
        }
    }
}
