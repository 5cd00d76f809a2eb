//! Contract Test: Record Reconciler
//!
//! Constraints verified:
//! - Every ensure/destroy call issues exactly one mutation, with no retries,
//!   except a type change, which deletes and recreates
//! - Create returns a fresh id and echoes the declared attributes
//! - Update keeps the id and is idempotent for fixed input
//! - Declarations are validated on update as well as on create
//! - Failures surface as Create, Update or NotFound errors

mod common;

use common::*;
use dnsrec_core::error::Error;
use dnsrec_core::record::{DesiredRecord, RecordId, RecordType};
use dnsrec_core::traits::RecordStore;
use dnsrec_core::{ReconcileAction, RecordReconciler};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn reconciler(store: &InstrumentedStore) -> RecordReconciler {
    RecordReconciler::new(Arc::new(store.clone()))
}

fn a_record(data: &str) -> DesiredRecord {
    DesiredRecord::new(ZONE, "terraform", RecordType::A, data)
}

#[tokio::test]
async fn create_returns_fresh_id_and_declared_attributes() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);

    let record = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    assert!(!record.id.is_empty());
    assert_eq!(record.domain, ZONE);
    assert_eq!(record.name, "terraform");
    assert_eq!(record.record_type, RecordType::A);
    assert_eq!(record.data, "192.168.0.10");
    assert_eq!(store.calls.creates(), 1);
    assert_eq!(store.calls.mutations(), 1);

    // Round trip through the store returns the same record
    let fetched = assert_ok!(store.retrieve_record(ZONE, &record.id).await);
    assert_eq!(fetched, record);
}

#[tokio::test]
async fn create_is_not_idempotent() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);

    let first = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);
    let second = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    assert_ne!(first.id, second.id);
    assert_eq!(store.inner.records_in(ZONE).await.len(), 2);
}

#[tokio::test]
async fn update_keeps_id_and_is_idempotent() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    let desired = a_record("192.168.0.11");
    let first = assert_ok!(reconciler.ensure(&desired, Some(&created.id)).await);
    let second = assert_ok!(reconciler.ensure(&desired, Some(&created.id)).await);

    assert_eq!(first.id, created.id);
    assert_eq!(first.data, "192.168.0.11");
    assert_eq!(first, second);
    assert_eq!(store.calls.updates(), 2);
    assert_eq!(store.inner.records_in(ZONE).await, vec![second]);
}

#[tokio::test]
async fn invalid_data_is_rejected_before_any_call() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);

    let err = assert_err!(reconciler.ensure(&a_record("not-an-ip"), None).await);
    assert!(matches!(err, Error::Create { .. }), "got {:?}", err);

    let aaaa = DesiredRecord::new(ZONE, "v6", RecordType::Aaaa, "192.168.0.10");
    assert_err!(reconciler.ensure(&aaaa, None).await);

    assert_eq!(store.calls.mutations(), 0);
}

#[tokio::test]
async fn cname_data_is_stored_verbatim() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);

    for target in ["a.example.com.", "a.b", "a.example.net."] {
        let desired = DesiredRecord::new(ZONE, "terraform", RecordType::Cname, target);
        let record = assert_ok!(reconciler.ensure(&desired, None).await);
        assert_eq!(record.data, target);
    }
}

#[tokio::test]
async fn remote_create_rejection_is_a_create_error() {
    let store = seeded_store().await;
    store.set(&store.faults.reject_create, true);

    let err = assert_err!(reconciler(&store).ensure(&a_record("192.168.0.10"), None).await);
    assert!(matches!(err, Error::Create { .. }), "got {:?}", err);
    assert_eq!(store.calls.creates(), 1);
}

#[tokio::test]
async fn create_in_missing_zone_fails() {
    let store = InstrumentedStore::new();
    let err = assert_err!(reconciler(&store).ensure(&a_record("192.168.0.10"), None).await);
    assert!(matches!(err, Error::Create { .. }), "got {:?}", err);
}

#[tokio::test]
async fn update_of_vanished_record_is_not_found() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);

    let err = assert_err!(
        reconciler
            .ensure(&a_record("192.168.0.11"), Some(&RecordId::from(4242u64)))
            .await
    );
    assert!(err.is_not_found(), "got {:?}", err);
    assert_eq!(store.calls.retrieves(), 1);
    assert_eq!(store.calls.mutations(), 0);
}

#[tokio::test]
async fn invalid_data_is_rejected_on_update() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    for data in ["not-an-ip", ""] {
        let err = assert_err!(reconciler.ensure(&a_record(data), Some(&created.id)).await);
        assert!(matches!(err, Error::Update { .. }), "got {:?}", err);
    }

    assert_eq!(store.calls.updates(), 0);
    let unchanged = assert_ok!(store.retrieve_record(ZONE, &created.id).await);
    assert_eq!(unchanged.data, "192.168.0.10");
}

#[tokio::test]
async fn remote_update_rejection_is_an_update_error() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    store.set(&store.faults.reject_update, true);
    let err = assert_err!(
        reconciler
            .ensure(&a_record("192.168.0.11"), Some(&created.id))
            .await
    );
    assert!(matches!(err, Error::Update { .. }), "got {:?}", err);
    assert_eq!(store.calls.updates(), 1);
}

#[tokio::test]
async fn type_change_plans_replace() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    let cname = DesiredRecord::new(ZONE, "terraform", RecordType::Cname, "a.b");
    assert_eq!(reconciler.plan(&cname, Some(&created)), ReconcileAction::Replace);
    assert_eq!(store.calls.mutations(), 1);
}

#[tokio::test]
async fn type_change_recreates_with_new_id() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    let cname = DesiredRecord::new(ZONE, "terraform", RecordType::Cname, "a.b");
    let replaced = assert_ok!(reconciler.ensure(&cname, Some(&created.id)).await);

    assert_ne!(replaced.id, created.id);
    assert_eq!(replaced.record_type, RecordType::Cname);
    assert_eq!(replaced.data, "a.b");
    assert_eq!(store.calls.updates(), 0);
    assert_eq!(store.calls.deletes(), 1);

    let err = assert_err!(store.retrieve_record(ZONE, &created.id).await);
    assert!(err.is_not_found());
    assert_eq!(store.inner.records_in(ZONE).await, vec![replaced]);
}

#[tokio::test]
async fn rejected_delete_during_type_change_keeps_prior_record() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    store.set(&store.faults.reject_delete, true);
    let cname = DesiredRecord::new(ZONE, "terraform", RecordType::Cname, "a.b");
    let err = assert_err!(reconciler.ensure(&cname, Some(&created.id)).await);

    assert!(matches!(err, Error::Update { .. }), "got {:?}", err);
    assert_eq!(store.calls.creates(), 1);
    assert_eq!(store.inner.records_in(ZONE).await, vec![created]);
}

#[tokio::test]
async fn destroyed_record_cannot_be_retrieved() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    assert_ok!(reconciler.destroy(ZONE, &created.id).await);
    let err = assert_err!(store.retrieve_record(ZONE, &created.id).await);
    assert!(err.is_not_found());
    assert_eq!(store.calls.deletes(), 1);
}

#[tokio::test]
async fn remote_delete_rejection_is_a_delete_error() {
    let store = seeded_store().await;
    let reconciler = reconciler(&store);
    let created = assert_ok!(reconciler.ensure(&a_record("192.168.0.10"), None).await);

    store.set(&store.faults.reject_delete, true);
    let err = assert_err!(reconciler.destroy(ZONE, &created.id).await);
    assert!(matches!(err, Error::Delete { .. }), "got {:?}", err);
    assert_ok!(store.retrieve_record(ZONE, &created.id).await);
}
