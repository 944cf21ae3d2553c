//! # Cascade Purge Coordinator
//!
//! Removes everything derived from a spatial parent in two independent
//! phases: a `spatial_purge` job for the remote artifacts (database tables,
//! map-service workspaces), then deletion of the child resource records in
//! the catalog. Neither phase rolls back the other.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::job_submitter::JobSubmitter;
use super::types::{SubmitOutcome, SubmitRequest};
use crate::catalog::CatalogClient;
use crate::constants::events;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::logging::log_error;
use crate::models::{JobType, RequestContext, Resource};

/// Result of a cascade purge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Remote purge submission, `None` when the resource is not a parent
    pub purge_job: Option<SubmitOutcome>,
    /// Why the remote purge could not be submitted
    pub remote_error: Option<String>,
    pub deleted: Vec<String>,
    /// Children whose deletion failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl PurgeReport {
    /// Nothing was done because the resource is not a spatial parent
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.remote_error.is_none() && self.failed.is_empty()
    }
}

pub struct PurgeCoordinator {
    catalog: Arc<dyn CatalogClient>,
    submitter: Arc<JobSubmitter>,
    event_publisher: EventPublisher,
}

impl PurgeCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        submitter: Arc<JobSubmitter>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            catalog,
            submitter,
            event_publisher,
        }
    }

    /// Purge the remote artifacts and child records of `resource`.
    ///
    /// No-op unless the resource is a spatial parent. A rejected or
    /// unreachable purge job is reported and the local deletions still run;
    /// configuration and authorization errors abort before anything happens.
    pub async fn purge_derived_artifacts(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
    ) -> Result<PurgeReport> {
        if !resource.spatial_parent {
            debug!(resource_id = %resource.id, "Not a spatial parent, nothing to purge");
            return Ok(PurgeReport::skipped());
        }

        let package = self.catalog.show_package(&resource.package_id).await?;
        info!(
            resource_id = %resource.id,
            package = %package.name,
            "Submitting purge of spatial assets linked to resource"
        );

        let mut report = PurgeReport::default();
        // The host may already have removed the parent on delete
        let request = SubmitRequest::new(&resource.id, JobType::SpatialPurge)
            .with_package_name(&package.name)
            .with_resource(resource.clone());
        match self.submitter.submit_job(ctx, request).await {
            Ok(outcome) => report.purge_job = Some(outcome),
            Err(e) if e.is_validation_failure() => {
                error!(resource_id = %resource.id, error = %e, "Remote purge submission failed");
                report.remote_error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        for child_id in package.children_of(&resource.id) {
            match self.catalog.delete_resource(ctx, &child_id).await {
                Ok(()) => {
                    debug!(parent = %resource.id, child = %child_id, "Deleted spatial child resource");
                    self.event_publisher.publish(
                        events::PURGE_CHILD_DELETED,
                        json!({"resource_id": resource.id, "child_id": child_id}),
                    );
                    report.deleted.push(child_id);
                }
                Err(e) => {
                    log_error(
                        "purge_coordinator",
                        "delete_child",
                        &e.to_string(),
                        Some(child_id.as_str()),
                    );
                    self.event_publisher.publish(
                        events::PURGE_CHILD_DELETE_FAILED,
                        json!({"resource_id": resource.id, "child_id": child_id, "error": e.to_string()}),
                    );
                    report.failed.push((child_id, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}
