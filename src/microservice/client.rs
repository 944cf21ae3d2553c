//! # Spatial Ingestor HTTP Client
//!
//! reqwest client for the microservice job API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{job_endpoint, job_url, IngestorService, JobRequest};
use crate::config::IngestorConfig;
use crate::error::{Result, SpatialIngestorError};
use crate::models::JobReference;

#[derive(Clone)]
pub struct IngestorHttpClient {
    client: Client,
    base_url: Option<Url>,
}

impl std::fmt::Debug for IngestorHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestorHttpClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}

impl IngestorHttpClient {
    /// Build the client. A missing `microservice_url` is reported on first use,
    /// not here.
    pub fn new(config: &IngestorConfig) -> Result<Self> {
        let base_url = match config.microservice_url.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(config.microservice_base()?),
            _ => None,
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(format!("spatial-ingestor-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SpatialIngestorError::configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, base_url })
    }

    fn base(&self) -> Result<&Url> {
        self.base_url.as_ref().ok_or_else(|| {
            SpatialIngestorError::configuration(
                "Config option `microservice_url` must be set to use the SpatialIngestor.",
            )
        })
    }
}

fn transport_error(err: &reqwest::Error) -> SpatialIngestorError {
    SpatialIngestorError::Transport {
        message: "Could not connect to Spatial Ingestor.".to_string(),
        details: err.to_string(),
    }
}

/// Turn a non-2xx response into `RemoteRejection`, keeping the body as JSON if it parses
async fn rejection(response: Response, context: &str) -> SpatialIngestorError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let details = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    SpatialIngestorError::RemoteRejection {
        status_code: status.as_u16(),
        message: format!("{context}: {status}"),
        details,
    }
}

fn string_field(body: &Value, field: &str) -> Result<String> {
    match body.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(SpatialIngestorError::InvalidResponse {
            field: field.to_string(),
            reason: "missing from job submission response".to_string(),
        }),
    }
}

#[async_trait]
impl IngestorService for IngestorHttpClient {
    async fn submit_job(&self, request: &JobRequest) -> Result<JobReference> {
        let url = job_endpoint(self.base()?)?;
        debug!(url = %url, job_type = %request.job_type, "Posting job to spatial ingestor");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            let err = rejection(response, "An Error occurred while sending the job").await;
            warn!(error = %err, "Spatial ingestor rejected job");
            return Err(err);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SpatialIngestorError::InvalidResponse {
                field: "body".to_string(),
                reason: e.to_string(),
            })?;

        Ok(JobReference {
            job_id: string_field(&body, "job_id")?,
            job_key: string_field(&body, "job_key")?,
        })
    }

    async fn job_detail(&self, job_id: &str, job_key: Option<&str>) -> Result<Value> {
        let url = job_url(self.base()?, job_id)?;
        let mut request = self.client.get(url);
        if let Some(key) = job_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let response = request.send().await.map_err(|e| transport_error(&e))?;
        if !response.status().is_success() {
            return Err(rejection(response, "Failed to fetch job status").await);
        }

        response
            .json()
            .await
            .map_err(|e| SpatialIngestorError::InvalidResponse {
                field: "body".to_string(),
                reason: e.to_string(),
            })
    }
}
