//! Lifecycle scenarios against the in-memory store.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Once;
use std::time::Duration;

use spicedb_relationship::testing::{InMemoryStore, StoreOperation};
use spicedb_relationship::{
    Client, Consistency, DesiredState, Error, ErrorKind, LifecycleState, OperationContext,
    PlanAction, ReadOutcome, ReconcileError, Relationship, RelationshipResource,
    ResourceLifecycle,
};
use tokio_util::sync::CancellationToken;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn setup() -> (InMemoryStore, RelationshipResource) {
    init_tracing();
    let store = InMemoryStore::new();
    let resource = RelationshipResource::new(Client::from_transport(store.clone()));
    (store, resource)
}

fn state(s: &str) -> DesiredState {
    DesiredState::new(s).unwrap()
}

#[tokio::test]
async fn create_twice_is_idempotent() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@user:alice");

    resource.create(&ctx, &desired).await.unwrap();
    resource.create(&ctx, &desired).await.unwrap();

    assert_eq!(store.relationships(), vec![desired.relationship().clone()]);
}

#[tokio::test]
async fn delete_absent_succeeds() {
    let (store, resource) = setup();
    let desired = state("document:doc1#viewer@user:alice");

    resource
        .delete(&OperationContext::new(), &desired)
        .await
        .unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn read_after_create_is_present() {
    let (_, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@group:eng#member");

    resource.create(&ctx, &desired).await.unwrap();
    let outcome = resource.read(&ctx, &desired).await.unwrap();
    assert_eq!(outcome, ReadOutcome::Present(desired));
}

#[tokio::test]
async fn read_requires_full_consistency() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@user:alice");

    resource.read(&ctx, &desired).await.unwrap();
    assert_eq!(
        store.last_read_consistency(),
        Some(Consistency::FullyConsistent)
    );

    resource.create(&ctx, &desired).await.unwrap();
    resource.read(&ctx, &desired).await.unwrap();
    assert_eq!(
        store.last_read_consistency(),
        Some(Consistency::FullyConsistent)
    );
}

#[tokio::test]
async fn create_delete_read_is_absent() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@user:alice");

    resource.create(&ctx, &desired).await.unwrap();
    resource.delete(&ctx, &desired).await.unwrap();
    let outcome = resource.read(&ctx, &desired).await.unwrap();

    assert_eq!(outcome, ReadOutcome::Absent);
    assert_eq!(store.open_streams(), 0);
}

#[tokio::test]
async fn full_state_machine() {
    let (_, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@user:alice");

    let mut lifecycle = LifecycleState::default();
    resource.create(&ctx, &desired).await.unwrap();
    lifecycle = lifecycle.on_created().unwrap();

    let found = resource.read(&ctx, &desired).await.unwrap().is_present();
    lifecycle = lifecycle.on_read(found).unwrap();
    assert_eq!(lifecycle, LifecycleState::Present);

    resource.delete(&ctx, &desired).await.unwrap();
    lifecycle = lifecycle.on_deleted().unwrap();
    assert!(lifecycle.is_terminal());
}

#[tokio::test]
async fn drift_is_reported_as_absent() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@user:alice");

    resource.create(&ctx, &desired).await.unwrap();
    store.remove(desired.relationship());

    let outcome = resource.read(&ctx, &desired).await.unwrap();
    assert!(outcome.into_state().is_none());
    assert_eq!(
        LifecycleState::Present.on_read(false).unwrap(),
        LifecycleState::Absent
    );
}

#[tokio::test]
async fn read_never_matches_partial_overlap() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();

    for other in [
        "document:doc1#viewer@user:bob",
        "document:doc1#editor@user:alice",
        "document:doc2#viewer@user:alice",
        "folder:doc1#viewer@user:alice",
        "document:doc1#viewer@group:alice",
        "document:doc1#viewer@user:alice#member",
    ] {
        store.insert(other.parse::<Relationship>().unwrap());
    }

    let desired = state("document:doc1#viewer@user:alice");
    assert_eq!(
        resource.read(&ctx, &desired).await.unwrap(),
        ReadOutcome::Absent
    );

    let subject_set = state("document:doc1#viewer@user:alice#member");
    assert!(resource.read(&ctx, &subject_set).await.unwrap().is_present());
}

#[tokio::test]
async fn delete_removes_only_exact_match() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let neighbour: Relationship = "document:doc1#viewer@user:alice#member".parse().unwrap();
    store.insert(neighbour.clone());

    let desired = state("document:doc1#viewer@user:alice");
    resource.create(&ctx, &desired).await.unwrap();
    resource.delete(&ctx, &desired).await.unwrap();

    assert_eq!(store.relationships(), vec![neighbour]);
}

#[tokio::test]
async fn cancel_mid_stream_releases_stream() {
    let (store, resource) = setup();
    let desired = state("document:doc1#viewer@user:alice");
    store.insert(desired.relationship().clone());
    store.set_item_delay(Duration::from_secs(60));

    let token = CancellationToken::new();
    let ctx = OperationContext::new().with_cancellation(token.clone());

    let read = tokio::spawn({
        let resource = resource.clone();
        let desired = desired.clone();
        async move { resource.read(&ctx, &desired).await }
    });

    while store.open_streams() == 0 {
        tokio::task::yield_now().await;
    }
    token.cancel();

    let err = read.await.unwrap().unwrap_err();
    assert!(matches!(err, ReconcileError::Cancelled));
    assert_eq!(store.open_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_mid_stream_releases_stream() {
    let (store, resource) = setup();
    let desired = state("document:doc1#viewer@user:alice");
    store.insert(desired.relationship().clone());
    store.set_item_delay(Duration::from_secs(60));

    let ctx = OperationContext::new().with_timeout(Duration::from_secs(1));
    let err = resource.read(&ctx, &desired).await.unwrap_err();

    assert!(matches!(err, ReconcileError::DeadlineExceeded));
    assert!(err.is_cancellation());
    assert_eq!(store.open_streams(), 0);
}

#[tokio::test]
async fn stream_error_releases_stream() {
    let (store, resource) = setup();
    let desired = state("document:doc1#viewer@user:alice");
    store.fail_stream_after(0, Error::new(ErrorKind::Unavailable, "stream reset by peer"));

    let err = resource
        .read(&OperationContext::new(), &desired)
        .await
        .unwrap_err();

    assert_eq!(err.remote().unwrap().message(), "stream reset by peer");
    assert_eq!(
        err.diagnostic().detail,
        "Unable to get relationship: stream reset by peer"
    );
    assert_eq!(store.open_streams(), 0);
}

#[tokio::test]
async fn remote_failures_are_not_retried() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let desired = state("document:doc1#viewer@user:alice");

    store.fail_next(StoreOperation::Write, Error::unavailable("unavailable"));
    assert!(resource.create(&ctx, &desired).await.is_err());
    assert_eq!(store.request_count(), 1);

    store.fail_next(StoreOperation::Read, Error::unavailable("unavailable"));
    assert!(resource.read(&ctx, &desired).await.is_err());
    assert_eq!(store.request_count(), 2);
}

#[tokio::test]
async fn failed_create_leaves_state_untouched() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let existing = state("document:doc1#viewer@user:alice");
    resource.create(&ctx, &existing).await.unwrap();

    store.fail_next(StoreOperation::Write, Error::internal("boom"));
    let other = state("document:doc2#viewer@user:alice");
    assert!(resource.create(&ctx, &other).await.is_err());

    assert_eq!(store.relationships(), vec![existing.relationship().clone()]);
}

#[tokio::test]
async fn import_then_read() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    store.insert("document:doc1#viewer@group:eng#member".parse().unwrap());

    let imported = resource
        .import(&ctx, "document:doc1#viewer@group:eng#member")
        .await
        .unwrap();
    assert!(resource.read(&ctx, &imported).await.unwrap().is_present());
}

#[tokio::test]
async fn replace_on_change() {
    let (store, resource) = setup();
    let ctx = OperationContext::new();
    let prior = state("document:doc1#viewer@user:alice");
    resource.create(&ctx, &prior).await.unwrap();

    let plan = resource
        .plan(Some(&prior), Some("document:doc1#viewer@user:bob"))
        .unwrap();
    assert_eq!(plan.action(), PlanAction::Replace);

    let proposed = plan.proposed().unwrap().clone();
    assert!(matches!(
        resource.update(&ctx, &prior, &proposed).await,
        Err(ReconcileError::RequiresReplace { .. })
    ));

    resource.delete(&ctx, &prior).await.unwrap();
    resource.create(&ctx, &proposed).await.unwrap();
    assert_eq!(store.relationships(), vec![proposed.relationship().clone()]);
}

#[tokio::test]
async fn concurrent_instances_share_client() {
    let (store, resource) = setup();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resource = resource.clone();
            tokio::spawn(async move {
                let ctx = OperationContext::new();
                let desired = state(&format!("document:doc{}#viewer@user:alice", i));
                resource.create(&ctx, &desired).await.unwrap();
                resource.read(&ctx, &desired).await.unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_present());
    }
    assert_eq!(store.len(), 8);
    assert_eq!(store.open_streams(), 0);
}
