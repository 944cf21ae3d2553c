//! # Status Poller
//!
//! Read-only view of a job: the stored task status record merged with the
//! live job detail from the microservice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::catalog::{check_access, AccessPolicy, Permission, TaskStatusStore};
use crate::config::IngestorConfig;
use crate::constants::STATUS_UNREACHABLE;
use crate::error::{Result, SpatialIngestorError};
use crate::microservice::{job_url, IngestorService};
use crate::models::{JobType, RequestContext};
use crate::state_machine::TaskState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusReport {
    pub status: TaskState,
    pub job_id: Option<String>,
    pub job_url: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub job_key: Option<String>,
    /// Live detail from the microservice, or an inline error when unreachable
    pub task_info: Option<Value>,
    pub error: Value,
}

pub struct StatusPoller {
    config: Arc<IngestorConfig>,
    tasks: Arc<dyn TaskStatusStore>,
    access: Arc<dyn AccessPolicy>,
    service: Arc<dyn IngestorService>,
}

impl StatusPoller {
    pub fn new(
        config: Arc<IngestorConfig>,
        tasks: Arc<dyn TaskStatusStore>,
        access: Arc<dyn AccessPolicy>,
        service: Arc<dyn IngestorService>,
    ) -> Self {
        Self {
            config,
            tasks,
            access,
            service,
        }
    }

    pub async fn get_status(
        &self,
        ctx: &RequestContext,
        resource_id: &str,
        job_type: JobType,
    ) -> Result<JobStatusReport> {
        check_access(self.access.as_ref(), ctx, Permission::ReadResource, resource_id).await?;

        let task = self
            .tasks
            .show_task(resource_id, job_type)
            .await?
            .ok_or_else(|| SpatialIngestorError::not_found("Task status", resource_id))?;

        let base = self.config.microservice_base()?;

        let value = task.value_json();
        let job_id = value.get("job_id").and_then(Value::as_str).map(str::to_string);
        let job_key = value.get("job_key").and_then(Value::as_str).map(str::to_string);

        let (job_url, task_info) = match &job_id {
            Some(id) => {
                let url = job_url(&base, id)?;
                let detail = match self.service.job_detail(id, job_key.as_deref()).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!(resource_id = %resource_id, job_id = %id, error = %e, "Job status lookup failed");
                        json!({"error": STATUS_UNREACHABLE})
                    }
                };
                (Some(url.to_string()), Some(detail))
            }
            None => (None, None),
        };

        Ok(JobStatusReport {
            status: task.state.clone(),
            job_id,
            job_url,
            last_updated: task.last_updated,
            job_key,
            task_info,
            error: task.error_json(),
        })
    }
}
