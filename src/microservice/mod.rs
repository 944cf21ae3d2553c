//! # Spatial Ingestor Microservice
//!
//! The remote service that runs the actual geospatial processing. It is an
//! opaque collaborator: we post jobs, poll their detail, and receive
//! callbacks through the catalog.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::constants::JOB_ENDPOINT;
use crate::error::{Result, SpatialIngestorError};
use crate::models::{JobReference, JobType};

pub use client::IngestorHttpClient;

/// Body of `POST {base}/job`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub api_key: String,
    pub job_type: JobType,
    pub result_url: String,
    pub metadata: Map<String, Value>,
}

#[async_trait]
pub trait IngestorService: Send + Sync {
    /// Post a job; `Transport` on connection failures, `RemoteRejection` on non-2xx
    async fn submit_job(&self, request: &JobRequest) -> Result<JobReference>;

    /// Live job detail, authenticated with the job key
    async fn job_detail(&self, job_id: &str, job_key: Option<&str>) -> Result<Value>;
}

/// `{base}/job` with urljoin semantics
pub fn job_endpoint(base: &Url) -> Result<Url> {
    base.join(JOB_ENDPOINT)
        .map_err(|e| SpatialIngestorError::configuration(format!("Invalid job endpoint: {e}")))
}

/// `{base}/job/{job_id}` with urljoin semantics
pub fn job_url(base: &Url, job_id: &str) -> Result<Url> {
    base.join(&format!("{JOB_ENDPOINT}/{job_id}"))
        .map_err(|e| SpatialIngestorError::configuration(format!("Invalid job URL: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_urls_follow_urljoin() {
        let base = Url::parse("http://ingestor:8080/").unwrap();
        assert_eq!(job_endpoint(&base).unwrap().as_str(), "http://ingestor:8080/job");
        assert_eq!(
            job_url(&base, "abc").unwrap().as_str(),
            "http://ingestor:8080/job/abc"
        );

        // Without a trailing slash the last segment is replaced
        let base = Url::parse("http://host/api/v1").unwrap();
        assert_eq!(job_endpoint(&base).unwrap().as_str(), "http://host/api/job");
    }

    #[test]
    fn test_job_request_wire_format() {
        let request = JobRequest {
            api_key: "key".to_string(),
            job_type: JobType::SpatialPurge,
            result_url: "http://catalog/api/3/action/spatialingestor_hook".to_string(),
            metadata: Map::new(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["job_type"], "spatial_purge");
        assert_eq!(value["api_key"], "key");
        assert!(value["metadata"].as_object().unwrap().is_empty());
    }
}
