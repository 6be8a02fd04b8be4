//! HTTP contract of `/mutate` and the metrics it records.

use axum::http::StatusCode;
use serde_json::json;
use vpc_admission_webhook::store::StoreOp;

use crate::{
    Harness, PREFIX, ReviewBuilder, TEST_UID, namespace_object, pod_object, workspace,
    workspace_object,
};

#[tokio::test]
async fn test_uid_is_echoed_on_every_outcome() {
    let harness = Harness::new(PREFIX);
    harness.store.insert(workspace("team-a"));

    let reviews = [
        ReviewBuilder::new("Pod", "web")
            .namespace("team-a-dev")
            .object(pod_object("web", "team-a-dev", &[None])),
        ReviewBuilder::new("Namespace", "team-a-dev").object(namespace_object(
            "team-a-dev",
            &[("kubesphere.io/workspace", "team-a")],
            &[],
        )),
        ReviewBuilder::new("Namespace", "orphan").object(namespace_object("orphan", &[], &[])),
        ReviewBuilder::new("ConfigMap", "settings")
            .namespace("team-a-dev")
            .object(json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": "settings" } })),
    ];

    for review in reviews {
        let (status, body) = harness.post(review.build()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["apiVersion"], "admission.k8s.io/v1");
        assert_eq!(body["kind"], "AdmissionReview");
        assert_eq!(body["response"]["uid"], TEST_UID);
    }
}

#[tokio::test]
async fn test_patched_response_carries_json_patch() {
    let harness = Harness::new(PREFIX);
    harness.store.insert(workspace("team-a"));

    let review = ReviewBuilder::new("Namespace", "team-a-dev").object(namespace_object(
        "team-a-dev",
        &[("kubesphere.io/workspace", "team-a")],
        &[],
    ));
    let (_, body) = harness.post(review.build()).await;
    assert_eq!(body["response"]["allowed"], true);
    assert_eq!(body["response"]["patchType"], "JSONPatch");
}

#[tokio::test]
async fn test_unsupported_kind_message() {
    let harness = Harness::new(PREFIX);

    let review = ReviewBuilder::new("ConfigMap", "settings")
        .namespace("team-a-dev")
        .object(json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": "settings" } }));
    let (_, body) = harness.post(review.build()).await;
    assert_eq!(body["response"]["allowed"], false);
    assert_eq!(
        body["response"]["status"]["message"],
        "Not support for this Kind of resource ConfigMap"
    );
    assert!(harness.store.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_review_is_rejected() {
    let harness = Harness::new(PREFIX);

    let (status, body) = harness
        .post(json!({ "apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["response"]["allowed"], false);
}

#[tokio::test]
async fn test_admission_metrics_are_recorded() {
    let harness = Harness::new(PREFIX);

    let review = ReviewBuilder::new("Namespace", "orphan").object(namespace_object("orphan", &[], &[]));
    harness.post(review.build()).await;

    let review = ReviewBuilder::new("Workspace", "team-a")
        .operation("CREATE")
        .object(workspace_object("team-a"));
    harness.post(review.build()).await;

    let metrics = harness.metrics().await;
    assert!(metrics.contains("vpcwebhook_admissions_total{kind=\"Namespace\",outcome=\"denied\"} 1"));
    assert!(metrics.contains("vpcwebhook_admissions_total{kind=\"Workspace\",outcome=\"allowed\"} 1"));
    assert!(metrics.contains("vpcwebhook_vpc_operations_total{operation=\"create\",result=\"created\"} 1"));
}

#[tokio::test]
async fn test_failed_vpc_operation_is_counted() {
    let harness = Harness::new(PREFIX);
    harness.store.fail_on(StoreOp::Get);

    let review = ReviewBuilder::new("Workspace", "team-a").operation("DELETE");
    let (_, body) = harness.post(review.build()).await;
    assert_eq!(body["response"]["allowed"], false);

    let metrics = harness.metrics().await;
    assert!(metrics.contains("vpcwebhook_vpc_operations_total{operation=\"delete\",result=\"failed\"} 1"));
}
