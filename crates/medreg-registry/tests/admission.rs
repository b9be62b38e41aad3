//! End-to-end admission scenarios against real store backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use medreg_registry::{AdmissionError, AdmissionKind, Registry, RegistryConfig};
use medreg_store::{
    FsRecordStore, InMemoryRecordStore, InMemoryStorageTree, RecordStore, StoreResult,
};

fn patient(id: &str, name: &str) -> Value {
    json!({
        "recordId": id,
        "name": name,
        "age": 30,
        "gender": "M",
        "bloodType": "O+",
    })
}

const NAMESPACE: &str = "patientData.patients";

fn config(capacity: u64) -> RegistryConfig {
    RegistryConfig {
        namespace: NAMESPACE.into(),
        ..RegistryConfig::with_capacity(capacity)
    }
}

fn in_memory(capacity: u64) -> (InMemoryRecordStore, Registry) {
    let store = InMemoryStorageTree::new().namespace(NAMESPACE).unwrap();
    let registry = Registry::new(config(capacity), Arc::new(store.clone())).unwrap();
    (store, registry)
}

/// Store that yields to the scheduler around every operation, so concurrent
/// submissions get every chance to interleave.
struct SlowStore {
    inner: InMemoryRecordStore,
}

#[async_trait]
impl RecordStore for SlowStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.inner.exists(key).await
    }

    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.inner.write(key, value).await
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys().await
    }
}

#[tokio::test]
async fn distinct_identities_up_to_capacity_are_all_admitted() {
    let (_store, registry) = in_memory(25);
    for i in 0..25 {
        let admission = registry
            .submit(&patient(&format!("P{i}"), "A"))
            .await
            .unwrap();
        assert_eq!(admission.admitted_count, i + 1);
    }
    assert_eq!(registry.admitted_count().await, 25);
}

#[tokio::test]
async fn capacity_one_scenario() {
    let (store, registry) = in_memory(1);

    let first = registry.submit(&patient("P1", "A")).await.unwrap();
    assert_eq!(first.kind, AdmissionKind::Admitted);
    assert_eq!(registry.admitted_count().await, 1);

    let err = registry.submit(&patient("P2", "A")).await.unwrap_err();
    assert!(matches!(err, AdmissionError::CapacityExceeded { capacity: 1 }));

    let update = registry.submit(&patient("P1", "B")).await.unwrap();
    assert_eq!(update.kind, AdmissionKind::Updated);
    assert_eq!(registry.admitted_count().await, 1);

    let stored = registry.reader().fetch("P1").await.unwrap().unwrap();
    assert_eq!(stored["name"], json!("B"));
    assert_eq!(store.keys().await.unwrap(), vec!["P1"]);
}

#[tokio::test]
async fn missing_fields_scenario() {
    let (_store, registry) = in_memory(10);
    let err = registry.submit(&json!({ "name": "A" })).await.unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidRecordShape { .. }));
}

#[tokio::test]
async fn every_single_omitted_field_is_rejected() {
    let (_store, registry) = in_memory(10);
    for field in medreg_types::fields::REQUIRED {
        let mut record = patient("P1", "A");
        record.as_object_mut().unwrap().remove(field);
        let err = registry.submit(&record).await.unwrap_err();
        assert!(
            matches!(err, AdmissionError::InvalidRecordShape { ref reason } if reason.contains(field)),
            "omitting {field} should be rejected, got {err}"
        );
    }
    assert_eq!(registry.admitted_count().await, 0);
}

#[tokio::test]
async fn photo_scenarios() {
    let (_store, registry) = in_memory(10);

    let mut bad = patient("P1", "A");
    bad["photo"] = json!("not-a-data-uri");
    let err = registry.submit(&bad).await.unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidRecordShape { .. }));

    let mut good = patient("P1", "A");
    good["photo"] = json!("data:image/png;base64,AAA=");
    registry.submit(&good).await.unwrap();
    assert_eq!(registry.reader().fetch("P1").await.unwrap(), Some(good));
}

#[tokio::test]
async fn updates_are_last_write_wins() {
    let (_store, registry) = in_memory(3);
    for name in ["A", "B", "C", "D"] {
        registry.submit(&patient("P1", name)).await.unwrap();
    }
    assert_eq!(registry.admitted_count().await, 1);
    assert_eq!(
        registry.reader().fetch("P1").await.unwrap(),
        Some(patient("P1", "D"))
    );
}

#[tokio::test]
async fn registry_keeps_serving_after_errors() {
    let (_store, registry) = in_memory(2);
    registry.submit(&json!("garbage")).await.unwrap_err();
    registry.submit(&patient("P1", "A")).await.unwrap();
    registry.submit(&patient("P2", "A")).await.unwrap();
    registry.submit(&patient("P3", "A")).await.unwrap_err();
    registry.submit(&patient("P2", "B")).await.unwrap();
    assert_eq!(registry.admitted_count().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_new_identities_respect_capacity() {
    const N: usize = 40;
    const K: u64 = 7;

    let inner = InMemoryRecordStore::new();
    let store = Arc::new(SlowStore {
        inner: inner.clone(),
    });
    let registry = Arc::new(Registry::new(RegistryConfig::with_capacity(K), store).unwrap());

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.submit(&patient(&format!("P{i}"), "A")).await })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task should not panic") {
            Ok(admission) => {
                assert_eq!(admission.kind, AdmissionKind::Admitted);
                admitted += 1;
            }
            Err(AdmissionError::CapacityExceeded { capacity }) => {
                assert_eq!(capacity, K);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(admitted, K as usize);
    assert_eq!(rejected, N - K as usize);
    assert_eq!(registry.admitted_count().await, K);
    assert_eq!(inner.keys().await.unwrap().len(), K as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_to_one_identity_count_once() {
    let (_store, registry) = in_memory(5);
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.submit(&patient("P1", &format!("N{i}"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(registry.admitted_count().await, 1);
}

#[tokio::test]
async fn filesystem_backend_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let store = FsRecordStore::open(root.path(), NAMESPACE).await.unwrap();
    let registry = Registry::new(config(2), Arc::new(store)).unwrap();

    registry.submit(&patient("P1", "A")).await.unwrap();
    registry.submit(&patient("P1", "B")).await.unwrap();
    registry.submit(&patient("P2", "C")).await.unwrap();

    let all = registry.reader().fetch_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].1, patient("P1", "B"));
    assert!(root
        .path()
        .join("patientData")
        .join("patients")
        .join("P2.json")
        .is_file());
}

#[tokio::test]
async fn offers_exit_only_on_success() {
    let (_store, registry) = in_memory(1);

    let ok = registry
        .offer(registry.make_invitation(), &patient("P1", "A"))
        .await
        .unwrap();
    assert!(ok.seat.has_exited());

    let full = registry
        .offer(registry.make_invitation(), &patient("P2", "A"))
        .await
        .unwrap();
    assert!(!full.seat.has_exited());
    assert!(matches!(
        full.result,
        Err(AdmissionError::CapacityExceeded { .. })
    ));
}
