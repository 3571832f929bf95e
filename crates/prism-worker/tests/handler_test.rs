//! Invocation handler integration tests: notification JSON in, response out.
//!
//! Run with: `cargo test -p prism-worker --test handler_test`

mod helpers;

use helpers::fixtures::{notification, record};
use helpers::{TestPipeline, DESTINATION_BUCKET, SOURCE_BUCKET};
use prism_core::{FetchError, ProcessorConfig};
use prism_worker::handle_notification;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_notification_is_processed() {
    let pipeline = TestPipeline::new();
    pipeline.upload("cat.png", &b"0123456789"[..]);
    pipeline.upload("dog.png", &b"0123456789"[..]);

    let response =
        handle_notification(&pipeline.processor, &notification(&["cat.png", "dog.png"])).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        "Processed the following s3Objects: cat.png, dog.png"
    );
    assert!(response.batch_item_failures.is_empty());
    assert_eq!(pipeline.artifact_keys().len(), 6);
}

#[tokio::test]
async fn test_encoded_keys_are_decoded_before_fetch() {
    let pipeline = TestPipeline::new();
    pipeline.upload("summer holiday/beach.png", &b"0123456789"[..]);

    let response =
        handle_notification(&pipeline.processor, &notification(&["summer+holiday/beach.png"]))
            .await;

    assert!(response.batch_item_failures.is_empty());
    assert!(pipeline
        .artifact("red/summer holiday/beach.png")
        .is_some());
}

#[tokio::test]
async fn test_failed_records_are_listed_for_redelivery() {
    let pipeline = TestPipeline::new();
    pipeline.upload("cat.png", &b"0123456789"[..]);
    pipeline.storage.fail_get(
        SOURCE_BUCKET,
        "dog.png",
        FetchError::Transient("throttled".into()),
    );

    let response =
        handle_notification(&pipeline.processor, &notification(&["cat.png", "dog.png"])).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Processed the following s3Objects: cat.png");
    assert_eq!(response.batch_item_failures, vec![record("dog.png")]);
    assert_eq!(response.outcomes.len(), 2);

    let v = serde_json::to_value(&response).unwrap();
    assert_eq!(
        v["batchItemFailures"],
        json!([{ "bucket": "uploads", "key": "dog.png" }])
    );
    assert_eq!(v["outcomes"][1]["status"], "FAILURE");
    assert_eq!(v["outcomes"][1]["cause"]["kind"], "transient");
}

#[tokio::test]
async fn test_malformed_notification_is_rejected_without_processing() {
    let pipeline = TestPipeline::new();

    let response = handle_notification(
        &pipeline.processor,
        &json!({ "Records": [{ "eventName": "ObjectCreated:Put", "s3": { "object": { "key": "x" } } }] }),
    )
    .await;

    assert_eq!(response.status_code, 400);
    assert!(response.outcomes.is_empty());
    assert_eq!(pipeline.storage.get_count(), 0);
}

#[tokio::test]
async fn test_removal_events_are_ignored() {
    let pipeline = TestPipeline::new();
    let doc = json!({ "Records": [{
        "eventName": "ObjectRemoved:Delete",
        "s3": { "bucket": { "name": "uploads" }, "object": { "key": "cat.png" } }
    }]});

    let response = handle_notification(&pipeline.processor, &doc).await;

    assert_eq!(response.status_code, 200);
    assert!(response.outcomes.is_empty());
    assert_eq!(pipeline.storage.get_count(), 0);
}

#[tokio::test]
async fn test_configured_budget_reports_unfinished_records() {
    let pipeline = TestPipeline::with_config(
        ProcessorConfig::new(DESTINATION_BUCKET)
            .with_invocation_timeout(Some(Duration::from_millis(200))),
    );
    pipeline.upload("cat.png", &b"0123456789"[..]);
    pipeline.upload("slow.png", &b"0123456789"[..]);
    pipeline
        .storage
        .delay_get(SOURCE_BUCKET, "slow.png", Duration::from_secs(5));

    let response =
        handle_notification(&pipeline.processor, &notification(&["cat.png", "slow.png"])).await;

    assert_eq!(response.outcomes.len(), 1);
    assert_eq!(response.unfinished, vec![record("slow.png")]);
    assert_eq!(response.batch_item_failures, vec![record("slow.png")]);
}
