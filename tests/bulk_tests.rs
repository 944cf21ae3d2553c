//! Operator-driven purge and re-ingest across packages.

mod common;

use common::*;
use spatial_ingestor::models::{JobType, Package, Resource};

fn seed_two_packages(harness: &TestHarness) {
    harness.seed_package(vec![
        shapefile_parent(),
        Resource::new("c1", "p1").with_format("WMS").child_of("r1"),
    ]);
    harness.catalog.insert_package(Package {
        id: "p2".to_string(),
        name: "rivers".to_string(),
        resources: vec![
            Resource::new("r5", "p2")
                .with_url("http://files.example.com/rivers.kml")
                .as_parent(),
            Resource::new("c5", "p2").with_format("WFS").child_of("r5"),
            Resource::new("r6", "p2").with_format("CSV"),
        ],
        ..Package::default()
    });
}

#[tokio::test]
async fn test_purge_package_removes_children_of_every_parent() {
    let harness = TestHarness::new();
    seed_two_packages(&harness);

    let report = harness
        .ingestor
        .maintenance()
        .purge_package("p2")
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.processed, 2);
    assert_eq!(harness.catalog.deleted_resources(), vec!["c5".to_string()]);
    assert!(harness.catalog.resource("c1").is_some());
}

#[tokio::test]
async fn test_purge_all_isolates_failures() {
    let harness = TestHarness::new();
    seed_two_packages(&harness);
    harness.catalog.fail_deletes_for("c1");

    let report = harness.ingestor.maintenance().purge_all().await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "r1");
    assert!(report.failed[0].error.contains("c1"));
    assert_eq!(harness.catalog.deleted_resources(), vec!["c5".to_string()]);
    assert_eq!(harness.service.submission_count(), 2);
}

#[tokio::test]
async fn test_reingest_all_submits_every_parent_as_maintenance_user() {
    let harness = TestHarness::new();
    seed_two_packages(&harness);

    let report = harness.ingestor.maintenance().reingest_all().await.unwrap();

    assert!(report.is_clean());
    let submissions = harness.service.submissions();
    let mut resources: Vec<_> = submissions
        .iter()
        .map(|s| s.request.metadata["resource_id"].as_str().unwrap().to_string())
        .collect();
    resources.sort();
    assert_eq!(resources, vec!["r1".to_string(), "r5".to_string()]);
    assert!(submissions.iter().all(|s| s.request.api_key == ADMIN_KEY));
    assert!(harness.catalog.task("r5", JobType::SpatialIngest).is_some());
}

#[tokio::test]
async fn test_reingest_all_continues_past_unreadable_package() {
    let harness = TestHarness::new();
    seed_two_packages(&harness);
    harness.catalog.fail_package_reads_for("p1");

    let report = harness.ingestor.maintenance().reingest_all().await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "p1");
    assert_eq!(harness.service.submission_count(), 1);
}

#[tokio::test]
async fn test_reingest_records_rejected_submissions() {
    let harness = TestHarness::new();
    seed_two_packages(&harness);
    harness
        .service
        .reject_next(422, serde_json::json!({"error": "bad file"}));

    let report = harness
        .ingestor
        .maintenance()
        .reingest_package("p1")
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "r1");
    assert_eq!(report.processed, 1);
}
