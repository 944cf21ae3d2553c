//! Configuration Loader
//!
//! Layers an optional settings file (TOML, YAML or JSON, picked by extension)
//! under `SPATIALINGESTOR__*` environment variables.

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::IngestorConfig;
use crate::error::{Result, SpatialIngestorError};

/// Prefix of environment overrides, e.g. `SPATIALINGESTOR__MICROSERVICE_URL`
pub const ENV_PREFIX: &str = "SPATIALINGESTOR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Arc<IngestorConfig>> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading spatial ingestor settings file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let settings = builder.build().map_err(|e| {
            SpatialIngestorError::configuration(format!("Failed to read settings: {e}"))
        })?;
        let config: IngestorConfig = settings.try_deserialize().map_err(|e| {
            SpatialIngestorError::configuration(format!("Invalid settings: {e}"))
        })?;

        debug!(
            microservice_url = ?config.microservice_url,
            site_url = %config.site_url,
            auto_ingest = config.auto_ingest,
            target_formats = ?config.target_formats,
            "Spatial ingestor configuration loaded"
        );

        Ok(Arc::new(config))
    }

    /// Load from a file, failing on any validation issue
    pub fn load_validated(path: &Path) -> Result<Arc<IngestorConfig>> {
        let config = Self::load(Some(path))?;
        let issues = config.validate();
        if issues.is_empty() {
            Ok(config)
        } else {
            Err(SpatialIngestorError::configuration(issues.join("; ")))
        }
    }
}
