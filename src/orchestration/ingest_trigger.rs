//! # Ingest Trigger
//!
//! Entry point for "this resource should be ingested". A spatial parent is
//! submitted unless a job is already in flight; an admissible candidate is
//! first flagged as a parent through a catalog update, and the resulting
//! change event submits it.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::admission::AdmissionFilter;
use super::job_submitter::{ingest_request, JobSubmitter};
use super::types::SubmitOutcome;
use crate::catalog::CatalogClient;
use crate::constants::events;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::models::{JobReference, RequestContext, Resource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Submitted(JobReference),
    /// A job for the resource is already in flight
    AlreadyInFlight,
    /// The resource vanished before submission
    ResourceMissing,
    /// The submission was rejected or could not reach the microservice
    SubmissionFailed(String),
    /// The candidate was flagged as a spatial parent; its change event submits it
    FlaggedParent,
    /// The owning package could not be read, nothing was changed
    PackageUnavailable(String),
    NotIngestible,
}

pub struct IngestTrigger {
    catalog: Arc<dyn CatalogClient>,
    admission: Arc<AdmissionFilter>,
    submitter: Arc<JobSubmitter>,
    event_publisher: EventPublisher,
}

impl IngestTrigger {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        admission: Arc<AdmissionFilter>,
        submitter: Arc<JobSubmitter>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            catalog,
            admission,
            submitter,
            event_publisher,
        }
    }

    pub async fn ingest_resource(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
    ) -> Result<IngestOutcome> {
        if resource.spatial_parent {
            return self.submit_parent(ctx, resource).await;
        }

        if !self.admission.is_ingestible(resource).await? {
            return Ok(IngestOutcome::NotIngestible);
        }

        let package = match self.catalog.show_package(&resource.package_id).await {
            Ok(package) => package,
            Err(e) => {
                error!(package_id = %resource.package_id, error = %e, "Failed to retrieve package");
                return Ok(IngestOutcome::PackageUnavailable(e.to_string()));
            }
        };
        info!(package = %package.name, resource_id = %resource.id, "Flagging resource as spatial parent");

        let mut flagged = resource.clone();
        flagged.spatial_parent = true;
        match self.catalog.update_resource(ctx, &flagged).await {
            Ok(_) => {
                self.event_publisher.publish(
                    events::INGEST_FLAGGED_PARENT,
                    json!({"resource_id": resource.id, "package": package.name}),
                );
                Ok(IngestOutcome::FlaggedParent)
            }
            Err(e) if e.is_validation_failure() => {
                error!(resource_id = %resource.id, error = %e, "Failed to flag resource as spatial parent");
                Ok(IngestOutcome::SubmissionFailed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn submit_parent(
        &self,
        ctx: &RequestContext,
        resource: &Resource,
    ) -> Result<IngestOutcome> {
        debug!(resource_id = %resource.id, "Submitting resource to spatial ingestor");
        match self
            .submitter
            .submit_if_idle(ctx, ingest_request(&resource.id))
            .await
        {
            Ok(SubmitOutcome::Submitted(job)) => Ok(IngestOutcome::Submitted(job)),
            Ok(SubmitOutcome::ResourceMissing) => Ok(IngestOutcome::ResourceMissing),
            Ok(SubmitOutcome::AlreadyInFlight(state)) => {
                self.event_publisher.publish(
                    events::INGEST_SKIPPED,
                    json!({"resource_id": resource.id, "state": state}),
                );
                Ok(IngestOutcome::AlreadyInFlight)
            }
            Err(e) if e.is_validation_failure() => {
                error!(resource_id = %resource.id, error = %e, "Spatial ingestor submission failed");
                Ok(IngestOutcome::SubmissionFailed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}
