//! In-process catalog used for development runs and tests.
//!
//! Implements every collaborator trait over `parking_lot` guarded maps and
//! records the writes it receives so callers can inspect the sequence of
//! task status updates and resource deletions.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{AccessPolicy, CatalogClient, Permission, TaskStatusStore};
use crate::error::{Result, SpatialIngestorError};
use crate::models::{Activity, JobType, Package, RequestContext, Resource, TaskStatus, User};

#[derive(Debug, Default)]
struct CatalogState {
    packages: HashMap<String, Package>,
    activities: HashMap<String, Vec<Activity>>,
    users: HashMap<String, User>,
    tasks: HashMap<(String, JobType), TaskStatus>,
    task_writes: Vec<TaskStatus>,
    deleted_resources: Vec<String>,
    failing_deletes: HashSet<String>,
    unreadable_packages: HashSet<String>,
    denied: HashSet<(String, Permission)>,
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a package together with its resources
    pub fn insert_package(&self, package: Package) {
        self.state
            .write()
            .packages
            .insert(package.id.clone(), package);
    }

    /// Add or replace a resource inside an existing package
    pub fn insert_resource(&self, resource: Resource) -> Result<()> {
        let mut state = self.state.write();
        let package = state
            .packages
            .get_mut(&resource.package_id)
            .ok_or_else(|| SpatialIngestorError::not_found("Package", &resource.package_id))?;
        package.resources.retain(|r| r.id != resource.id);
        package.resources.push(resource);
        Ok(())
    }

    pub fn insert_user(&self, user: User) {
        self.state.write().users.insert(user.id.clone(), user);
    }

    /// Prepend an activity so it becomes the most recent one
    pub fn record_activity(&self, package_id: &str, activity: Activity) {
        self.state
            .write()
            .activities
            .entry(package_id.to_string())
            .or_default()
            .insert(0, activity);
    }

    pub fn fail_deletes_for(&self, resource_id: &str) {
        self.state
            .write()
            .failing_deletes
            .insert(resource_id.to_string());
    }

    pub fn fail_package_reads_for(&self, package_id: &str) {
        self.state
            .write()
            .unreadable_packages
            .insert(package_id.to_string());
    }

    pub fn deny(&self, user: &str, permission: Permission) {
        self.state
            .write()
            .denied
            .insert((user.to_string(), permission));
    }

    /// Every task status write, in order
    pub fn task_writes(&self) -> Vec<TaskStatus> {
        self.state.read().task_writes.clone()
    }

    pub fn deleted_resources(&self) -> Vec<String> {
        self.state.read().deleted_resources.clone()
    }

    pub fn task(&self, entity_id: &str, task_type: JobType) -> Option<TaskStatus> {
        self.state
            .read()
            .tasks
            .get(&(entity_id.to_string(), task_type))
            .cloned()
    }

    pub fn resource(&self, id: &str) -> Option<Resource> {
        find_resource(&self.state.read(), id).cloned()
    }
}

fn find_resource<'a>(state: &'a CatalogState, id: &str) -> Option<&'a Resource> {
    state
        .packages
        .values()
        .flat_map(|p| p.resources.iter())
        .find(|r| r.id == id)
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn show_resource(&self, id: &str) -> Result<Resource> {
        find_resource(&self.state.read(), id)
            .cloned()
            .ok_or_else(|| SpatialIngestorError::not_found("Resource", id))
    }

    async fn update_resource(&self, _ctx: &RequestContext, resource: &Resource) -> Result<Resource> {
        let mut state = self.state.write();
        let package = state
            .packages
            .get_mut(&resource.package_id)
            .ok_or_else(|| SpatialIngestorError::not_found("Package", &resource.package_id))?;
        let slot = package
            .resources
            .iter_mut()
            .find(|r| r.id == resource.id)
            .ok_or_else(|| SpatialIngestorError::not_found("Resource", &resource.id))?;
        *slot = resource.clone();
        Ok(resource.clone())
    }

    async fn delete_resource(&self, _ctx: &RequestContext, id: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.failing_deletes.contains(id) {
            return Err(SpatialIngestorError::catalog(format!(
                "Failed to delete resource {id}"
            )));
        }
        let mut removed = false;
        for package in state.packages.values_mut() {
            let before = package.resources.len();
            package.resources.retain(|r| r.id != id);
            removed |= package.resources.len() != before;
        }
        if !removed {
            return Err(SpatialIngestorError::not_found("Resource", id));
        }
        state.deleted_resources.push(id.to_string());
        Ok(())
    }

    async fn show_package(&self, id: &str) -> Result<Package> {
        let state = self.state.read();
        if state.unreadable_packages.contains(id) {
            return Err(SpatialIngestorError::catalog(format!(
                "Failed to read package {id}"
            )));
        }
        state
            .packages
            .get(id)
            .cloned()
            .ok_or_else(|| SpatialIngestorError::not_found("Package", id))
    }

    async fn package_activity_list(&self, package_id: &str) -> Result<Vec<Activity>> {
        Ok(self
            .state
            .read()
            .activities
            .get(package_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_package_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.state.read().packages.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn show_user(&self, id_or_name: &str) -> Result<User> {
        let state = self.state.read();
        state
            .users
            .get(id_or_name)
            .or_else(|| state.users.values().find(|u| u.name == id_or_name))
            .cloned()
            .ok_or_else(|| SpatialIngestorError::not_found("User", id_or_name))
    }
}

#[async_trait]
impl TaskStatusStore for InMemoryCatalog {
    async fn show_task(&self, entity_id: &str, task_type: JobType) -> Result<Option<TaskStatus>> {
        Ok(self.task(entity_id, task_type))
    }

    async fn update_task(&self, mut task: TaskStatus) -> Result<TaskStatus> {
        let mut state = self.state.write();
        let key = (task.entity_id.clone(), task.task_type);
        // One record per (entity_id, task_type): an insert for an existing pair
        // takes over the stored identifier.
        let existing_id = state.tasks.get(&key).and_then(|t| t.id.clone());
        if task.id.is_none() {
            task.id = Some(existing_id.unwrap_or_else(|| Uuid::new_v4().to_string()));
        }
        state.tasks.insert(key, task.clone());
        state.task_writes.push(task.clone());
        Ok(task)
    }
}

#[async_trait]
impl AccessPolicy for InMemoryCatalog {
    async fn is_authorized(
        &self,
        user: &str,
        permission: Permission,
        _resource_id: &str,
    ) -> Result<bool> {
        Ok(!self
            .state
            .read()
            .denied
            .contains(&(user.to_string(), permission)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::TaskState;

    fn seeded() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.insert_package(Package {
            id: "p1".to_string(),
            name: "roads".to_string(),
            resources: vec![Resource::new("r1", "p1"), Resource::new("c1", "p1").child_of("r1")],
            ..Package::default()
        });
        catalog
    }

    #[tokio::test]
    async fn test_task_store_keeps_one_record_per_pair() {
        let catalog = seeded();
        let first = catalog
            .update_task(TaskStatus::submitting("r1", JobType::SpatialIngest))
            .await
            .unwrap();
        let second = catalog
            .update_task(TaskStatus::submitting("r1", JobType::SpatialIngest))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(catalog.task_writes().len(), 2);
        let stored = catalog
            .show_task("r1", JobType::SpatialIngest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state, TaskState::Submitting);
        assert!(catalog
            .show_task("r1", JobType::SpatialPurge)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_resource() {
        let catalog = seeded();
        let ctx = RequestContext::for_user("admin");
        catalog.delete_resource(&ctx, "c1").await.unwrap();
        assert!(catalog.resource("c1").is_none());
        assert_eq!(catalog.deleted_resources(), vec!["c1"]);

        let err = catalog.delete_resource(&ctx, "c1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_access_denial() {
        let catalog = seeded();
        catalog.deny("guest", Permission::DeleteResource);
        assert!(!catalog
            .is_authorized("guest", Permission::DeleteResource, "r1")
            .await
            .unwrap());
        assert!(catalog
            .is_authorized("guest", Permission::ReadResource, "r1")
            .await
            .unwrap());
    }
}
