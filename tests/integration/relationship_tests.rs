//! Relationship lifecycle against a live store, over both transports.

use spicedb_relationship::{
    OperationContext, ReadOutcome, ReconcileError, ResourceLifecycle, Transport,
};

use crate::common::{resource, state, unique_id};

async fn create_read_delete(transport: Transport) {
    let resource = resource(transport).await.unwrap();
    let ctx = OperationContext::new();
    let desired = state(&format!(
        "document:{}#viewer@user:{}",
        unique_id("doc"),
        unique_id("alice")
    ));

    let applied = resource.create(&ctx, &desired).await.unwrap();
    assert!(!applied.written_at.is_empty());

    // A second touch is a no-op.
    resource.create(&ctx, &desired).await.unwrap();

    assert_eq!(
        resource.read(&ctx, &desired).await.unwrap(),
        ReadOutcome::Present(desired.clone())
    );

    resource.delete(&ctx, &desired).await.unwrap();
    assert_eq!(resource.read(&ctx, &desired).await.unwrap(), ReadOutcome::Absent);

    // Deleting again matches nothing and still succeeds.
    resource.delete(&ctx, &desired).await.unwrap();
}

#[tokio::test]
async fn test_lifecycle_grpc() {
    create_read_delete(Transport::Grpc).await;
}

#[tokio::test]
async fn test_lifecycle_http() {
    create_read_delete(Transport::Http).await;
}

#[tokio::test]
async fn test_subject_set_is_distinct_from_direct_subject() {
    let resource = resource(Transport::Grpc).await.unwrap();
    let ctx = OperationContext::new();
    let doc = unique_id("doc");
    let group = unique_id("eng");

    let subject_set = state(&format!("document:{}#viewer@group:{}#member", doc, group));
    resource.create(&ctx, &subject_set).await.unwrap();

    let self_referential = state(&format!("group:{}#member@group:{}#member", group, group));
    resource.create(&ctx, &self_referential).await.unwrap();
    assert!(resource.read(&ctx, &self_referential).await.unwrap().is_present());

    let other_doc = state(&format!("document:{}-other#viewer@group:{}#member", doc, group));
    assert_eq!(resource.read(&ctx, &other_doc).await.unwrap(), ReadOutcome::Absent);

    resource.delete(&ctx, &subject_set).await.unwrap();
    resource.delete(&ctx, &self_referential).await.unwrap();
}

#[tokio::test]
async fn test_wildcard_subject() {
    let resource = resource(Transport::Grpc).await.unwrap();
    let ctx = OperationContext::new();
    let desired = state(&format!("document:{}#viewer@user:*", unique_id("public")));

    resource.create(&ctx, &desired).await.unwrap();
    assert!(resource.read(&ctx, &desired).await.unwrap().is_present());
    resource.delete(&ctx, &desired).await.unwrap();
}

#[tokio::test]
async fn test_schema_violation_is_reported_verbatim() {
    let resource = resource(Transport::Grpc).await.unwrap();
    let ctx = OperationContext::new();
    let desired = state(&format!("document:{}#owner@user:alice", unique_id("doc")));

    let err = resource.create(&ctx, &desired).await.unwrap_err();
    let ReconcileError::Write { source, .. } = &err else {
        panic!("expected write error, got {:?}", err);
    };
    assert!(source.message().contains("owner"), "message: {}", source.message());
    assert!(err.diagnostic().detail.contains(source.message()));
}

#[tokio::test]
async fn test_import_existing() {
    let resource = resource(Transport::Grpc).await.unwrap();
    let ctx = OperationContext::new();
    let id = format!("user:{}#self@user:{}", unique_id("u"), unique_id("u"));

    let created = state(&id);
    resource.create(&ctx, &created).await.unwrap();

    let imported = resource.import(&ctx, &id).await.unwrap();
    assert_eq!(imported, created);
    assert!(resource.read(&ctx, &imported).await.unwrap().is_present());

    resource.delete(&ctx, &imported).await.unwrap();
}
