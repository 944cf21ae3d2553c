//! # Admission Filter
//!
//! Decides whether a resource may be handed to the spatial ingestor:
//! its format must be a recognised spatial format, it must not be a derived
//! child, and neither its organization, its package nor its last editor may
//! be blacklisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use crate::catalog::CatalogClient;
use crate::config::IngestorConfig;
use crate::error::Result;
use crate::models::Resource;

/// Spatial input formats the microservice understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpatialFormat {
    Shp,
    Kml,
    Kmz,
    Grid,
}

impl SpatialFormat {
    /// Detect the format from the override, then the declared format, then the URL.
    ///
    /// Matching is a case-insensitive suffix comparison.
    pub fn detect(resource: &Resource) -> Option<Self> {
        let check = resource
            .format_override()
            .or(resource.format.as_deref())
            .or(resource.url.as_deref())
            .unwrap_or_default()
            .trim()
            .to_uppercase();

        if check.ends_with("SHP") || check.ends_with("SHAPEFILE") {
            Some(Self::Shp)
        } else if check.ends_with("KML") {
            Some(Self::Kml)
        } else if check.ends_with("KMZ") {
            Some(Self::Kmz)
        } else if check.ends_with("GRID") {
            Some(Self::Grid)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shp => "SHP",
            Self::Kml => "KML",
            Self::Kmz => "KMZ",
            Self::Grid => "GRID",
        }
    }
}

impl fmt::Display for SpatialFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a resource was rejected by the blacklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistMatch {
    Organization(String),
    Package(String),
    LastEditor(String),
}

pub struct AdmissionFilter {
    config: Arc<IngestorConfig>,
    catalog: Arc<dyn CatalogClient>,
}

impl AdmissionFilter {
    pub fn new(config: Arc<IngestorConfig>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { config, catalog }
    }

    /// Format recognised, not a child, and not blacklisted.
    ///
    /// The format and child checks short-circuit before any catalog read.
    pub async fn is_ingestible(&self, resource: &Resource) -> Result<bool> {
        let Some(format) = SpatialFormat::detect(resource) else {
            return Ok(false);
        };
        if resource.is_child() {
            debug!(resource_id = %resource.id, "Derived spatial child is never ingested");
            return Ok(false);
        }
        if self.blacklist_match(resource).await?.is_some() {
            return Ok(false);
        }
        debug!(resource_id = %resource.id, format = %format, "Resource admitted");
        Ok(true)
    }

    pub async fn is_blacklisted(&self, resource: &Resource) -> Result<bool> {
        Ok(self.blacklist_match(resource).await?.is_some())
    }

    /// First blacklist the resource falls under, if any.
    ///
    /// Reads the owning package, and the package activity stream when a user
    /// blacklist is configured. The last editor falls back to the package
    /// creator when there is no activity.
    pub async fn blacklist_match(&self, resource: &Resource) -> Result<Option<BlacklistMatch>> {
        let blacklists = &self.config.blacklists;
        if blacklists.is_empty() {
            return Ok(None);
        }

        let package = self.catalog.show_package(&resource.package_id).await?;

        if let Some(org) = package
            .organization
            .as_ref()
            .filter(|org| blacklists.org.contains(&org.name))
        {
            error!(organization = %org.name, "Organization is in the spatial ingestor blacklist");
            return Ok(Some(BlacklistMatch::Organization(org.name.clone())));
        }

        if blacklists.pkg.contains(&package.name) {
            error!(package = %package.name, "Package is in the spatial ingestor blacklist");
            return Ok(Some(BlacklistMatch::Package(package.name)));
        }

        if blacklists.user.is_empty() {
            return Ok(None);
        }

        let activity = self.catalog.package_activity_list(&package.id).await?;
        let last_user = activity
            .first()
            .map(|a| a.user_id.clone())
            .or(package.creator_user_id);

        match last_user {
            Some(user) if blacklists.user.contains(&user) => {
                error!(user = %user, package = %package.name, "Package was last edited by a blacklisted user");
                Ok(Some(BlacklistMatch::LastEditor(user)))
            }
            _ => Ok(None),
        }
    }
}
