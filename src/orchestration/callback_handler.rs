//! # Callback Handler
//!
//! Applies the microservice's asynchronous status notifications to the task
//! status record and resubmits the resource when it changed while the job
//! was running.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::job_submitter::JobSubmitter;
use super::types::{SubmitOutcome, SubmitRequest};
use crate::catalog::{check_access, AccessPolicy, CatalogClient, Permission, TaskStatusStore};
use crate::constants::events;
use crate::error::{Result, SpatialIngestorError};
use crate::events::EventPublisher;
use crate::logging::log_job_operation;
use crate::models::{JobType, RequestContext, Resource};
use crate::state_machine::{TaskEvent, TaskState};

/// Payload the microservice posts to the hook endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackPayload {
    /// Echo of the submission metadata
    pub metadata: Map<String, Value>,
    pub status: String,
    /// Job the notification is about, when the microservice sends it
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
}

impl CallbackPayload {
    /// Parse a raw hook body, rejecting missing fields before any side effect
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SpatialIngestorError::validation("Callback body must be an object"))?;
        for field in ["metadata", "status"] {
            if object.get(field).map_or(true, Value::is_null) {
                return Err(SpatialIngestorError::validation(format!(
                    "Missing value: {field}"
                )));
            }
        }
        serde_json::from_value(value)
            .map_err(|e| SpatialIngestorError::validation(format!("Invalid callback: {e}")))
    }

    pub fn resource_id(&self) -> Result<&str> {
        self.metadata
            .get("resource_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SpatialIngestorError::validation("Missing value: resource_id"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The status was recorded, no resubmission needed
    Applied(TaskState),
    /// The status was recorded and the stale resource was submitted again
    Resubmitted(SubmitOutcome),
    /// The callback names a job other than the one the record tracks;
    /// `current` is `None` while a new submission is still in progress
    StaleJob {
        received: String,
        current: Option<String>,
    },
}

pub struct CallbackHandler {
    catalog: Arc<dyn CatalogClient>,
    tasks: Arc<dyn TaskStatusStore>,
    access: Arc<dyn AccessPolicy>,
    submitter: Arc<JobSubmitter>,
    event_publisher: EventPublisher,
}

impl CallbackHandler {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        tasks: Arc<dyn TaskStatusStore>,
        access: Arc<dyn AccessPolicy>,
        submitter: Arc<JobSubmitter>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            catalog,
            tasks,
            access,
            submitter,
            event_publisher,
        }
    }

    pub async fn on_job_callback(
        &self,
        ctx: &RequestContext,
        payload: CallbackPayload,
    ) -> Result<CallbackOutcome> {
        let resource_id = payload.resource_id()?.to_string();
        let job_type = payload.job_type.unwrap_or(JobType::SpatialIngest);

        check_access(
            self.access.as_ref(),
            ctx,
            Permission::for_job(job_type),
            &resource_id,
        )
        .await?;

        let mut task = self
            .tasks
            .show_task(&resource_id, job_type)
            .await?
            .ok_or_else(|| SpatialIngestorError::not_found("Task status", &resource_id))?;

        if let Some(received) = &payload.job_id {
            // A record still `submitting` has no job yet; any named job is an older one
            let current = task.job_reference().map(|job| job.job_id);
            let superseded = match &current {
                Some(current) => received != current,
                None => task.state == TaskState::Submitting,
            };
            if superseded {
                warn!(
                    resource_id = %resource_id,
                    received_job = %received,
                    current_job = ?current,
                    state = %task.state,
                    "Ignoring callback for a superseded job"
                );
                self.event_publisher.publish(
                    events::JOB_CALLBACK_IGNORED,
                    json!({
                        "resource_id": resource_id,
                        "job_id": received,
                        "current_job_id": &current
                    }),
                );
                return Ok(CallbackOutcome::StaleJob {
                    received: received.clone(),
                    current,
                });
            }
        }

        let status = TaskState::from(payload.status.as_str());
        task.apply(TaskEvent::CallbackReceived(status.clone()));

        let resubmit = status == TaskState::Complete
            && job_type == JobType::SpatialIngest
            && self.resource_changed(&resource_id, &payload.metadata).await;

        self.tasks.update_task(task).await?;
        log_job_operation("callback", &resource_id, job_type.as_str(), status.as_str(), None);
        self.event_publisher.publish(
            events::JOB_CALLBACK_APPLIED,
            json!({"resource_id": resource_id, "job_type": job_type, "status": status}),
        );

        if !resubmit {
            return Ok(CallbackOutcome::Applied(status));
        }

        info!(resource_id = %resource_id, "Resource modified during processing, resubmitting");
        let outcome = self
            .submitter
            .submit_job(&ctx.elevated(), SubmitRequest::new(&resource_id, job_type))
            .await?;
        self.event_publisher.publish(
            events::JOB_RESUBMITTED,
            json!({"resource_id": resource_id, "job_type": job_type}),
        );
        Ok(CallbackOutcome::Resubmitted(outcome))
    }

    /// Staleness check; a resource that cannot be read counts as unchanged
    async fn resource_changed(&self, resource_id: &str, metadata: &Map<String, Value>) -> bool {
        match self.catalog.show_resource(resource_id).await {
            Ok(resource) => needs_resubmission(&resource, metadata),
            Err(e) => {
                warn!(resource_id = %resource_id, error = %e, "Cannot read resource for staleness check");
                false
            }
        }
    }
}

/// True when the resource changed after the job's submission snapshot.
///
/// When both the resource's `last_modified` and the snapshot's
/// `task_created` are present, only the timestamps decide: stale when the
/// modification is strictly later, and an unparseable value counts as not
/// newer. Otherwise the resource URL is compared with the snapshot's
/// `original_url`.
pub fn needs_resubmission(resource: &Resource, metadata: &Map<String, Value>) -> bool {
    let snapshot_created = metadata.get("task_created").and_then(Value::as_str);
    if let (Some(modified), Some(created)) = (resource.last_modified.as_deref(), snapshot_created) {
        return match (parse_timestamp(modified), parse_timestamp(created)) {
            (Some(modified_at), Some(created_at)) if modified_at > created_at => {
                debug!(%modified_at, %created_at, "Uploaded file more recent than the job");
                true
            }
            (Some(_), Some(_)) => false,
            _ => {
                warn!(modified, created, "Unparseable timestamp in staleness check");
                false
            }
        };
    }

    let original_url = metadata.get("original_url").and_then(Value::as_str);
    match (resource.url.as_deref(), original_url) {
        (Some(current), Some(original)) if current != original => {
            debug!(current, original, "Resource URL changed since submission");
            true
        }
        _ => false,
    }
}

/// Parse catalog timestamps: RFC 3339, or naive ISO/space separated values taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
