//! # Job Submitter
//!
//! Posts jobs to the spatial ingestor and keeps the task status record in
//! step with the outcome.
//!
//! ## Sequence
//!
//! 1. Resolve the resource (or take the caller's snapshot); a vanished
//!    resource is a successful no-op.
//! 2. Under the per-key lock, reuse any existing record and mark it
//!    `submitting` before the network call, so a crash mid-call leaves a
//!    visible state.
//! 3. Build the job metadata (connection settings, staleness snapshot).
//! 4. Post the job; record `pending` with the job reference, or `error` with
//!    a `{message, details, status_code?}` payload.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::submission_lock::SubmissionLocks;
use super::types::{SubmitOutcome, SubmitRequest};
use crate::catalog::{check_access, AccessPolicy, CatalogClient, Permission, TaskStatusStore};
use crate::config::IngestorConfig;
use crate::constants::events;
use crate::error::{Result, SpatialIngestorError};
use crate::events::EventPublisher;
use crate::logging::log_job_operation;
use crate::microservice::{IngestorService, JobRequest};
use crate::models::{JobType, RequestContext, TaskError, TaskStatus};
use crate::state_machine::TaskState;

pub struct JobSubmitter {
    config: Arc<IngestorConfig>,
    catalog: Arc<dyn CatalogClient>,
    tasks: Arc<dyn TaskStatusStore>,
    access: Arc<dyn AccessPolicy>,
    service: Arc<dyn IngestorService>,
    locks: SubmissionLocks,
    event_publisher: EventPublisher,
}

impl JobSubmitter {
    pub fn new(
        config: Arc<IngestorConfig>,
        catalog: Arc<dyn CatalogClient>,
        tasks: Arc<dyn TaskStatusStore>,
        access: Arc<dyn AccessPolicy>,
        service: Arc<dyn IngestorService>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            config,
            catalog,
            tasks,
            access,
            service,
            locks: SubmissionLocks::new(),
            event_publisher,
        }
    }

    /// Submit unconditionally, superseding any previous cycle for the resource
    pub async fn submit_job(
        &self,
        ctx: &RequestContext,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        self.submit(ctx, request, false).await
    }

    /// Submit unless a job for the same resource and type is already in flight
    pub async fn submit_if_idle(
        &self,
        ctx: &RequestContext,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        self.submit(ctx, request, true).await
    }

    async fn submit(
        &self,
        ctx: &RequestContext,
        request: SubmitRequest,
        only_if_idle: bool,
    ) -> Result<SubmitOutcome> {
        request.validate()?;
        let SubmitRequest {
            resource_id,
            job_type,
            package_name,
            extra_metadata,
            resource,
        } = request;

        check_access(
            self.access.as_ref(),
            ctx,
            Permission::for_job(job_type),
            &resource_id,
        )
        .await?;

        let resource = match resource {
            Some(snapshot) => snapshot,
            None => match self.catalog.show_resource(&resource_id).await {
                Ok(resource) => resource,
                Err(e) if e.is_not_found() => {
                    debug!(resource_id = %resource_id, "Resource is gone, nothing to submit");
                    return Ok(SubmitOutcome::ResourceMissing);
                }
                Err(e) => return Err(e),
            },
        };

        self.config.microservice_base()?;
        let api_key = self.acting_api_key(ctx).await?;

        let mut task = {
            let _guard = self.locks.acquire(&resource_id, job_type).await;
            let existing = self.tasks.show_task(&resource_id, job_type).await?;

            if only_if_idle {
                if let Some(state) = existing.as_ref().and_then(|t| self.in_flight_state(t)) {
                    info!(
                        resource_id = %resource_id,
                        job_type = %job_type,
                        state = %state,
                        "Job already in flight, skipping submission"
                    );
                    return Ok(SubmitOutcome::AlreadyInFlight(state));
                }
            }

            let task = match existing {
                Some(mut task) => {
                    task.restart();
                    task
                }
                None => TaskStatus::submitting(&resource_id, job_type),
            };
            self.tasks.update_task(task).await?
        };

        self.event_publisher.publish(
            events::JOB_SUBMITTING,
            json!({"resource_id": resource_id, "job_type": job_type}),
        );

        let mut metadata = self.config.microservice_metadata()?;
        for (key, value) in extra_metadata {
            metadata.entry(key).or_insert(value);
        }
        metadata.insert("resource_id".to_string(), json!(resource_id));
        metadata.insert("ckan_url".to_string(), json!(self.config.site_url));
        metadata.insert(
            "task_created".to_string(),
            json!(task.last_updated.to_rfc3339()),
        );
        if let Some(url) = &resource.url {
            metadata.insert("original_url".to_string(), json!(url));
        }
        if let Some(name) = package_name {
            metadata.insert("package_name".to_string(), Value::String(name));
        }

        let job_request = JobRequest {
            api_key,
            job_type,
            result_url: self.config.callback_url(),
            metadata,
        };

        match self.service.submit_job(&job_request).await {
            Ok(job) => {
                task.accept(&job)?;
                self.tasks.update_task(task).await?;
                log_job_operation(
                    "submit",
                    &resource_id,
                    job_type.as_str(),
                    "pending",
                    Some(job.job_id.as_str()),
                );
                self.event_publisher.publish(
                    events::JOB_SUBMITTED,
                    json!({"resource_id": resource_id, "job_type": job_type, "job_id": job.job_id}),
                );
                Ok(SubmitOutcome::Submitted(job))
            }
            Err(e) if e.is_validation_failure() => {
                let payload = TaskError::from_error(&e);
                task.fail(&payload)?;
                self.tasks.update_task(task).await?;
                error!(
                    resource_id = %resource_id,
                    job_type = %job_type,
                    error = %e,
                    "Spatial ingestor job submission failed"
                );
                self.event_publisher.publish(
                    events::JOB_SUBMISSION_FAILED,
                    json!({"resource_id": resource_id, "job_type": job_type, "error": payload}),
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// API key of the acting user, forwarded for the callback's authorization
    async fn acting_api_key(&self, ctx: &RequestContext) -> Result<String> {
        let user = self.catalog.show_user(&ctx.user).await?;
        user.apikey
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                SpatialIngestorError::validation(format!("User {} has no API key", ctx.user))
            })
    }

    /// The state that blocks an idle-only submission, if any.
    ///
    /// `submitting` only counts while it is younger than twice the request
    /// timeout; older markers belong to an attempt that never finished.
    fn in_flight_state(&self, task: &TaskStatus) -> Option<TaskState> {
        match task.state {
            TaskState::Pending => Some(TaskState::Pending),
            TaskState::Submitting => {
                let window = Duration::milliseconds(
                    i64::try_from(self.config.request_timeout_ms)
                        .unwrap_or(i64::MAX / 2)
                        .saturating_mul(2),
                );
                (Utc::now() - task.last_updated < window).then_some(TaskState::Submitting)
            }
            _ => None,
        }
    }

    pub fn config(&self) -> &IngestorConfig {
        &self.config
    }
}

/// Shorthand for a `spatial_ingest` request
pub fn ingest_request(resource_id: impl Into<String>) -> SubmitRequest {
    SubmitRequest::new(resource_id, JobType::SpatialIngest)
}
