use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Result, SpatialIngestorError};

/// Kind of job delegated to the spatial ingestor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Ingest a spatial file into PostGIS/GeoServer and spawn child resources
    SpatialIngest,
    /// Remove every artifact derived from a parent resource
    SpatialPurge,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpatialIngest => "spatial_ingest",
            Self::SpatialPurge => "spatial_purge",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = SpatialIngestorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spatial_ingest" => Ok(Self::SpatialIngest),
            "spatial_purge" => Ok(Self::SpatialPurge),
            other => Err(SpatialIngestorError::validation(format!(
                "Unknown job_type: {other}"
            ))),
        }
    }
}

/// Handle on a job living inside the microservice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub job_id: String,
    pub job_key: String,
}

/// Payload written into a task status record's `error` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub message: String,
    pub details: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl TaskError {
    /// Build the persisted error payload for a failed submission
    pub fn from_error(err: &SpatialIngestorError) -> Self {
        match err {
            SpatialIngestorError::Transport { message, details } => Self {
                message: message.clone(),
                details: Value::String(details.clone()),
                status_code: None,
            },
            SpatialIngestorError::RemoteRejection {
                status_code,
                message,
                details,
            } => Self {
                message: message.clone(),
                details: details.clone(),
                status_code: Some(*status_code),
            },
            other => Self {
                message: "An Error occurred while sending the job".to_string(),
                details: Value::String(other.to_string()),
                status_code: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_type_names() {
        assert_eq!(JobType::SpatialIngest.to_string(), "spatial_ingest");
        assert_eq!(
            "spatial_purge".parse::<JobType>().unwrap(),
            JobType::SpatialPurge
        );
        assert!("ingest".parse::<JobType>().is_err());
    }

    #[test]
    fn test_task_error_from_remote_rejection() {
        let err = SpatialIngestorError::RemoteRejection {
            status_code: 409,
            message: "An Error occurred while sending the job: 409 Conflict".to_string(),
            details: json!({"error": "duplicate"}),
        };
        let payload = TaskError::from_error(&err);
        assert_eq!(payload.status_code, Some(409));
        assert_eq!(
            serde_json::to_value(&payload).unwrap()["details"]["error"],
            "duplicate"
        );
    }

    #[test]
    fn test_task_error_from_transport_omits_status() {
        let err = SpatialIngestorError::Transport {
            message: "Could not connect to Spatial Ingestor.".to_string(),
            details: "connection refused".to_string(),
        };
        let value = serde_json::to_value(TaskError::from_error(&err)).unwrap();
        assert!(value.get("status_code").is_none());
        assert_eq!(value["details"], "connection refused");
    }
}
