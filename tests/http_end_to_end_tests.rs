//! Full submit, callback and status cycle against an HTTP microservice stub.

mod common;

use common::*;
use serde_json::{json, Value};
use spatial_ingestor::catalog::InMemoryCatalog;
use spatial_ingestor::config::IngestorConfig;
use spatial_ingestor::models::{JobType, User};
use spatial_ingestor::orchestration::{
    ingest_request, CallbackOutcome, CallbackPayload, Collaborators, SpatialIngestor,
};
use spatial_ingestor::state_machine::TaskState;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn wired(server: &MockServer) -> (Arc<InMemoryCatalog>, SpatialIngestor) {
    let config = IngestorConfig {
        microservice_url: Some(server.uri()),
        request_timeout_ms: 2_000,
        ..test_config()
    };
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.insert_user(User {
        id: "u-admin".to_string(),
        name: ADMIN.to_string(),
        apikey: Some(ADMIN_KEY.to_string()),
    });
    catalog.insert_package(spatial_ingestor::models::Package {
        id: "p1".to_string(),
        name: "roads".to_string(),
        resources: vec![shapefile_parent()],
        ..Default::default()
    });
    let collaborators =
        Collaborators::with_http_service(&config, catalog.clone(), catalog.clone(), catalog.clone())
            .unwrap();
    (catalog, SpatialIngestor::new(Arc::new(config), collaborators))
}

#[tokio::test]
async fn test_submit_callback_and_status_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": "abc", "job_key": "secret"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job/abc"))
        .and(header("Authorization", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "complete"})))
        .expect(1)
        .mount(&server)
        .await;

    let (catalog, ingestor) = wired(&server).await;
    let ctx = spatial_ingestor::models::RequestContext::for_user(ADMIN);

    ingestor
        .submitter()
        .submit_job(&ctx, ingest_request("r1"))
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["job_type"], json!("spatial_ingest"));
    assert_eq!(body["api_key"], json!(ADMIN_KEY));

    let payload = CallbackPayload::from_value(json!({
        "metadata": body["metadata"],
        "status": "complete",
        "job_id": "abc"
    }))
    .unwrap();
    let outcome = ingestor.callbacks().on_job_callback(&ctx, payload).await.unwrap();
    assert_eq!(outcome, CallbackOutcome::Applied(TaskState::Complete));

    let report = ingestor
        .poller()
        .get_status(&ctx, "r1", JobType::SpatialIngest)
        .await
        .unwrap();
    assert_eq!(report.status, TaskState::Complete);
    assert_eq!(report.task_info, Some(json!({"status": "complete"})));
    assert_eq!(
        catalog.task("r1", JobType::SpatialIngest).unwrap().state,
        TaskState::Complete
    );
}

#[tokio::test]
async fn test_http_rejection_is_recorded_on_the_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "duplicate"})))
        .mount(&server)
        .await;

    let (catalog, ingestor) = wired(&server).await;
    let ctx = spatial_ingestor::models::RequestContext::for_user(ADMIN);

    let err = ingestor
        .submitter()
        .submit_job(&ctx, ingest_request("r1"))
        .await
        .unwrap_err();
    assert!(err.is_validation_failure());

    let task = catalog.task("r1", JobType::SpatialIngest).unwrap();
    assert_eq!(task.state, TaskState::Error);
    assert_eq!(task.error_json()["status_code"], json!(409));
    assert_eq!(task.error_json()["details"], json!({"error": "duplicate"}));
}
