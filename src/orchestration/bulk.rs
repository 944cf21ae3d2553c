//! # Bulk Maintenance
//!
//! Operator commands that purge or re-ingest every resource of one package or
//! of the whole catalog, acting as the configured maintenance user. A failing
//! resource or package is logged and recorded; its siblings still run.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::ingest_trigger::{IngestOutcome, IngestTrigger};
use super::purge_coordinator::{PurgeCoordinator, PurgeReport};
use crate::catalog::CatalogClient;
use crate::config::IngestorConfig;
use crate::error::Result;
use crate::logging::log_error;
use crate::models::RequestContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub processed: usize,
    pub failed: Vec<BulkFailure>,
}

impl BulkReport {
    fn record_failure(&mut self, id: &str, error: impl ToString) {
        self.failed.push(BulkFailure {
            id: id.to_string(),
            error: error.to_string(),
        });
    }

    fn merge(&mut self, other: BulkReport) {
        self.processed += other.processed;
        self.failed.extend(other.failed);
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Purge,
    Reingest,
}

pub struct BulkMaintenance {
    config: Arc<IngestorConfig>,
    catalog: Arc<dyn CatalogClient>,
    trigger: Arc<IngestTrigger>,
    purger: Arc<PurgeCoordinator>,
}

impl BulkMaintenance {
    pub fn new(
        config: Arc<IngestorConfig>,
        catalog: Arc<dyn CatalogClient>,
        trigger: Arc<IngestTrigger>,
        purger: Arc<PurgeCoordinator>,
    ) -> Self {
        Self {
            config,
            catalog,
            trigger,
            purger,
        }
    }

    fn context(&self) -> RequestContext {
        RequestContext::for_user(&self.config.maintenance_user)
    }

    /// Purge the spatial children of every resource in a package
    pub async fn purge_package(&self, package_id: &str) -> Result<BulkReport> {
        self.run_package(package_id, Operation::Purge).await
    }

    pub async fn purge_all(&self) -> Result<BulkReport> {
        self.run_all(Operation::Purge).await
    }

    /// Re-run the ingest trigger for every resource in a package
    pub async fn reingest_package(&self, package_id: &str) -> Result<BulkReport> {
        self.run_package(package_id, Operation::Reingest).await
    }

    pub async fn reingest_all(&self) -> Result<BulkReport> {
        self.run_all(Operation::Reingest).await
    }

    async fn run_all(&self, operation: Operation) -> Result<BulkReport> {
        let package_ids = self.catalog.list_package_ids().await?;
        info!(packages = package_ids.len(), ?operation, "Processing spatial resources for all packages");

        let mut report = BulkReport::default();
        for (index, package_id) in package_ids.iter().enumerate() {
            match self.run_package(package_id, operation).await {
                Ok(package_report) => report.merge(package_report),
                Err(e) => {
                    log_error("bulk_maintenance", "process_package", &e.to_string(), Some(package_id));
                    report.record_failure(package_id, e);
                }
            }
            info!(done = index + 1, total = package_ids.len(), "Bulk progress");
        }
        Ok(report)
    }

    async fn run_package(&self, package_id: &str, operation: Operation) -> Result<BulkReport> {
        let package = self.catalog.show_package(package_id).await?;
        info!(package = %package.name, ?operation, "Processing spatial resources for package");

        let ctx = self.context();
        let mut report = BulkReport::default();
        for listed in &package.resources {
            let resource = match self.catalog.show_resource(&listed.id).await {
                Ok(resource) => resource,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    report.record_failure(&listed.id, e);
                    continue;
                }
            };

            let result: std::result::Result<(), String> = match operation {
                Operation::Purge => match self.purger.purge_derived_artifacts(&ctx, &resource).await {
                    Ok(purge) if purge.is_complete() => Ok(()),
                    Ok(purge) => Err(purge_summary(&purge)),
                    Err(e) => Err(e.to_string()),
                },
                Operation::Reingest => match self.trigger.ingest_resource(&ctx, &resource).await {
                    Ok(IngestOutcome::SubmissionFailed(reason))
                    | Ok(IngestOutcome::PackageUnavailable(reason)) => Err(reason),
                    Ok(_) => Ok(()),
                    Err(e) => Err(e.to_string()),
                },
            };
            match result {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    error!(resource_id = %resource.id, error = %e, "Processing resource failed, continuing");
                    report.record_failure(&resource.id, e);
                }
            }
        }
        Ok(report)
    }
}

fn purge_summary(purge: &PurgeReport) -> String {
    let mut parts = Vec::new();
    if let Some(remote) = &purge.remote_error {
        parts.push(format!("remote purge: {remote}"));
    }
    for (child, reason) in &purge.failed {
        parts.push(format!("child {child}: {reason}"));
    }
    parts.join("; ")
}
