//! # Event Dispatcher
//!
//! Maps catalog lifecycle notifications onto the ingest trigger and the
//! purge coordinator.

use std::sync::Arc;
use tracing::debug;

use super::admission::AdmissionFilter;
use super::ingest_trigger::{IngestOutcome, IngestTrigger};
use super::purge_coordinator::{PurgeCoordinator, PurgeReport};
use crate::config::IngestorConfig;
use crate::error::Result;
use crate::models::{RequestContext, Resource};

/// Lifecycle notification for a resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    Created(Resource),
    /// Also used when the host does not name the operation
    Changed(Resource),
    Deleted(Resource),
    PurgeRequested(Resource),
}

impl ResourceEvent {
    pub fn resource(&self) -> &Resource {
        match self {
            Self::Created(r) | Self::Changed(r) | Self::Deleted(r) | Self::PurgeRequested(r) => r,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Changed(_) => "changed",
            Self::Deleted(_) => "deleted",
            Self::PurgeRequested(_) => "purge_requested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored,
    Ingest(IngestOutcome),
    Purge(PurgeReport),
}

pub struct EventDispatcher {
    config: Arc<IngestorConfig>,
    admission: Arc<AdmissionFilter>,
    trigger: Arc<IngestTrigger>,
    purger: Arc<PurgeCoordinator>,
}

impl EventDispatcher {
    pub fn new(
        config: Arc<IngestorConfig>,
        admission: Arc<AdmissionFilter>,
        trigger: Arc<IngestTrigger>,
        purger: Arc<PurgeCoordinator>,
    ) -> Self {
        Self {
            config,
            admission,
            trigger,
            purger,
        }
    }

    pub async fn notify(
        &self,
        ctx: &RequestContext,
        event: ResourceEvent,
    ) -> Result<DispatchOutcome> {
        if let ResourceEvent::Deleted(resource) | ResourceEvent::PurgeRequested(resource) = &event {
            let report = self.purger.purge_derived_artifacts(ctx, resource).await?;
            return Ok(DispatchOutcome::Purge(report));
        }

        let resource = event.resource();
        if !self.admission.is_ingestible(resource).await? {
            return Ok(DispatchOutcome::Ignored);
        }

        let should_ingest = match &event {
            ResourceEvent::Created(_) => self.config.auto_ingest,
            ResourceEvent::Changed(r) => r.spatial_parent,
            _ => false,
        };
        if !should_ingest {
            debug!(
                resource_id = %resource.id,
                operation = event.operation(),
                "Lifecycle event does not trigger ingest"
            );
            return Ok(DispatchOutcome::Ignored);
        }

        let outcome = self.trigger.ingest_resource(ctx, resource).await?;
        Ok(DispatchOutcome::Ingest(outcome))
    }
}
