//! # Host Catalog Collaborators
//!
//! The narrow interfaces through which the orchestrator reaches the hosting
//! catalog: resource/package reads and writes, the task status store, and
//! the catalog's authorization checks. The catalog owns all of this state.

pub mod memory;

use async_trait::async_trait;

use crate::error::{Result, SpatialIngestorError};
use crate::models::{Activity, JobType, Package, RequestContext, Resource, TaskStatus, User};

pub use memory::InMemoryCatalog;

/// Resource, package and user operations of the host catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Returns `NotFound` when the resource does not exist
    async fn show_resource(&self, id: &str) -> Result<Resource>;

    async fn update_resource(&self, ctx: &RequestContext, resource: &Resource) -> Result<Resource>;

    async fn delete_resource(&self, ctx: &RequestContext, id: &str) -> Result<()>;

    async fn show_package(&self, id: &str) -> Result<Package>;

    /// Activity stream of a package, newest first
    async fn package_activity_list(&self, package_id: &str) -> Result<Vec<Activity>>;

    /// Ids of every package that is not deleted
    async fn list_package_ids(&self) -> Result<Vec<String>>;

    async fn show_user(&self, id_or_name: &str) -> Result<User>;
}

/// Task status records keyed by (entity_id, task_type, `spatialingestor`)
#[async_trait]
pub trait TaskStatusStore: Send + Sync {
    async fn show_task(&self, entity_id: &str, task_type: JobType) -> Result<Option<TaskStatus>>;

    /// Insert or update; a record carrying an `id` updates that record
    async fn update_task(&self, task: TaskStatus) -> Result<TaskStatus>;
}

/// Catalog permissions the orchestrator checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    CreateResource,
    DeleteResource,
    ReadResource,
}

impl Permission {
    /// Right needed to submit (or be called back for) a job of `job_type`
    pub fn for_job(job_type: JobType) -> Self {
        match job_type {
            JobType::SpatialIngest => Self::CreateResource,
            JobType::SpatialPurge => Self::DeleteResource,
        }
    }
}

#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn is_authorized(
        &self,
        user: &str,
        permission: Permission,
        resource_id: &str,
    ) -> Result<bool>;
}

/// Fail with `NotAuthorized` unless `ctx` may perform `permission` on the resource
pub async fn check_access(
    policy: &dyn AccessPolicy,
    ctx: &RequestContext,
    permission: Permission,
    resource_id: &str,
) -> Result<()> {
    if ctx.ignore_auth {
        return Ok(());
    }
    if policy.is_authorized(&ctx.user, permission, resource_id).await? {
        Ok(())
    } else {
        Err(SpatialIngestorError::NotAuthorized(format!(
            "User {} may not {:?} on resource {}",
            ctx.user, permission, resource_id
        )))
    }
}
