use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;

use spatial_ingestor::catalog::InMemoryCatalog;
use spatial_ingestor::error::{Result, SpatialIngestorError};
use spatial_ingestor::microservice::{IngestorService, JobRequest};
use spatial_ingestor::models::JobReference;
use spatial_ingestor::state_machine::TaskState;

/// A job request as the microservice received it, with the task state the
/// catalog held at that moment
#[derive(Debug, Clone)]
pub struct ReceivedJob {
    pub request: JobRequest,
    pub task_state: Option<TaskState>,
}

/// Scripted stand-in for the spatial ingestor microservice
pub struct MockIngestorService {
    catalog: Arc<InMemoryCatalog>,
    submissions: Mutex<Vec<ReceivedJob>>,
    scripted: Mutex<VecDeque<Result<JobReference>>>,
    detail_calls: Mutex<Vec<(String, Option<String>)>>,
    detail_response: Mutex<Option<Result<Value>>>,
}

impl MockIngestorService {
    pub fn new(catalog: Arc<InMemoryCatalog>) -> Self {
        Self {
            catalog,
            submissions: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            detail_calls: Mutex::new(Vec::new()),
            detail_response: Mutex::new(None),
        }
    }

    /// Queue the outcome of the next submission; unscripted submissions succeed
    pub fn script_submission(&self, outcome: Result<JobReference>) {
        self.scripted.lock().push_back(outcome);
    }

    pub fn reject_next(&self, status_code: u16, body: Value) {
        self.script_submission(Err(SpatialIngestorError::RemoteRejection {
            status_code,
            message: format!("An Error occurred while sending the job: {status_code}"),
            details: body,
        }));
    }

    pub fn unreachable_next(&self) {
        self.script_submission(Err(SpatialIngestorError::Transport {
            message: "Could not connect to Spatial Ingestor.".to_string(),
            details: "connection refused".to_string(),
        }));
    }

    pub fn set_detail_response(&self, response: Result<Value>) {
        *self.detail_response.lock() = Some(response);
    }

    pub fn submissions(&self) -> Vec<ReceivedJob> {
        self.submissions.lock().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    pub fn detail_calls(&self) -> Vec<(String, Option<String>)> {
        self.detail_calls.lock().clone()
    }
}

#[async_trait]
impl IngestorService for MockIngestorService {
    async fn submit_job(&self, request: &JobRequest) -> Result<JobReference> {
        let resource_id = request
            .metadata
            .get("resource_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let task_state = self
            .catalog
            .task(resource_id, request.job_type)
            .map(|t| t.state);

        let number = {
            let mut submissions = self.submissions.lock();
            submissions.push(ReceivedJob {
                request: request.clone(),
                task_state,
            });
            submissions.len()
        };

        self.scripted.lock().pop_front().unwrap_or_else(|| {
            Ok(JobReference {
                job_id: format!("job-{number}"),
                job_key: format!("key-{number}"),
            })
        })
    }

    async fn job_detail(&self, job_id: &str, job_key: Option<&str>) -> Result<Value> {
        self.detail_calls
            .lock()
            .push((job_id.to_string(), job_key.map(str::to_string)));
        self.detail_response
            .lock()
            .clone()
            .unwrap_or_else(|| Ok(json!({"job_id": job_id, "status": "running"})))
    }
}
