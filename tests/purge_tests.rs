//! Cascade purge of a spatial parent's derived artifacts.

mod common;

use common::*;
use serde_json::json;
use spatial_ingestor::constants::events;
use spatial_ingestor::models::{JobType, Resource};
use spatial_ingestor::orchestration::SubmitOutcome;

fn parent_with_children() -> Vec<Resource> {
    vec![
        shapefile_parent(),
        Resource::new("c1", "p1")
            .with_url("http://catalog.example.com/geoserver/roads/wms")
            .with_format("WMS")
            .child_of("r1"),
        Resource::new("c2", "p1")
            .with_url("http://catalog.example.com/geoserver/roads/wfs")
            .with_format("WFS")
            .child_of("r1"),
        Resource::new("other", "p1").with_format("CSV"),
        Resource::new("c9", "p1").with_format("WMS").child_of("elsewhere"),
    ]
}

#[tokio::test]
async fn test_purge_deletes_exactly_the_children_and_issues_one_job() {
    let harness = TestHarness::new();
    harness.seed_package(parent_with_children());
    let parent = harness.resource("r1");

    let report = harness
        .ingestor
        .purger()
        .purge_derived_artifacts(&harness.ctx(), &parent)
        .await
        .unwrap();

    let mut deleted = harness.catalog.deleted_resources();
    deleted.sort();
    assert_eq!(deleted, vec!["c1".to_string(), "c2".to_string()]);
    assert_eq!(report.deleted.len(), 2);
    assert!(report.is_complete());
    assert!(matches!(report.purge_job, Some(SubmitOutcome::Submitted(_))));

    let submissions = harness.service.submissions();
    assert_eq!(submissions.len(), 1);
    let request = &submissions[0].request;
    assert_eq!(request.job_type, JobType::SpatialPurge);
    assert_eq!(request.metadata["package_name"], json!("roads"));
    assert_eq!(request.metadata["resource_id"], json!("r1"));

    assert!(harness.catalog.resource("r1").is_some());
    assert!(harness.catalog.resource("other").is_some());
    assert!(harness.catalog.resource("c9").is_some());
}

#[tokio::test]
async fn test_purge_of_non_parent_does_nothing() {
    let harness = TestHarness::new();
    harness.seed_package(parent_with_children());
    let plain = harness.resource("other");

    let report = harness
        .ingestor
        .purger()
        .purge_derived_artifacts(&harness.ctx(), &plain)
        .await
        .unwrap();

    assert_eq!(report.purge_job, None);
    assert!(report.deleted.is_empty());
    assert_eq!(harness.service.submission_count(), 0);
    assert!(harness.catalog.deleted_resources().is_empty());
    assert!(harness.catalog.task_writes().is_empty());
}

#[tokio::test]
async fn test_rejected_purge_job_still_deletes_children() {
    let harness = TestHarness::new();
    harness.seed_package(parent_with_children());
    harness.service.reject_next(503, json!({"error": "busy"}));
    let parent = harness.resource("r1");

    let report = harness
        .ingestor
        .purger()
        .purge_derived_artifacts(&harness.ctx(), &parent)
        .await
        .unwrap();

    assert!(report.remote_error.is_some());
    assert!(!report.is_complete());
    assert_eq!(report.deleted.len(), 2);
}

#[tokio::test]
async fn test_failed_child_deletion_does_not_stop_siblings() {
    let harness = TestHarness::new();
    harness.seed_package(parent_with_children());
    harness.catalog.fail_deletes_for("c1");
    let mut subscriber = harness.ingestor.event_publisher().subscribe();
    let parent = harness.resource("r1");

    let report = harness
        .ingestor
        .purger()
        .purge_derived_artifacts(&harness.ctx(), &parent)
        .await
        .unwrap();

    assert_eq!(report.deleted, vec!["c2".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "c1");

    let mut names = Vec::new();
    while let Ok(event) = subscriber.try_recv() {
        names.push(event.name);
    }
    assert!(names.contains(&events::PURGE_CHILD_DELETE_FAILED.to_string()));
    assert!(names.contains(&events::PURGE_CHILD_DELETED.to_string()));
}

#[tokio::test]
async fn test_unreadable_package_aborts_before_any_side_effect() {
    let harness = TestHarness::new();
    harness.seed_package(parent_with_children());
    harness.catalog.fail_package_reads_for("p1");
    let parent = harness.resource("r1");

    let result = harness
        .ingestor
        .purger()
        .purge_derived_artifacts(&harness.ctx(), &parent)
        .await;

    assert!(result.is_err());
    assert_eq!(harness.service.submission_count(), 0);
    assert!(harness.catalog.deleted_resources().is_empty());
}
