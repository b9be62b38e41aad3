//! Read side of the registry.
//!
//! Lists admitted identities and fetches stored records. No admission
//! control happens here.

use std::sync::Arc;

use serde_json::Value;

use medreg_store::RecordStore;
use medreg_types::RecordId;

use crate::error::{RegistryError, RegistryResult};

/// Read-only view over a registry namespace.
#[derive(Clone)]
pub struct RecordReader {
    store: Arc<dyn RecordStore>,
}

impl RecordReader {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Identities of every stored record, sorted.
    pub async fn list_ids(&self) -> RegistryResult<Vec<RecordId>> {
        self.store
            .keys()
            .await?
            .into_iter()
            .map(|key| {
                RecordId::new(key.clone()).map_err(|e| RegistryError::CorruptRecord {
                    record_id: key,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Fetch one record's full JSON.
    ///
    /// Returns `Ok(None)` if nothing is stored under `id`.
    pub async fn fetch(&self, id: &str) -> RegistryResult<Option<Value>> {
        match self.store.read(id).await? {
            Some(raw) => parse(id, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch every stored record, in identity order.
    pub async fn fetch_all(&self) -> RegistryResult<Vec<(RecordId, Value)>> {
        let ids = self.list_ids().await?;
        let keys: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let values = self.store.read_batch(&keys).await?;

        let mut records = Vec::with_capacity(ids.len());
        for (id, raw) in ids.into_iter().zip(values) {
            // A key listed a moment ago always has a value; entries are never
            // deleted.
            if let Some(raw) = raw {
                let value = parse(id.as_str(), &raw)?;
                records.push((id, value));
            }
        }
        Ok(records)
    }
}

fn parse(id: &str, raw: &str) -> RegistryResult<Value> {
    serde_json::from_str(raw).map_err(|e| RegistryError::CorruptRecord {
        record_id: id.to_string(),
        reason: e.to_string(),
    })
}

impl std::fmt::Debug for RecordReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordReader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medreg_store::InMemoryRecordStore;
    use serde_json::json;

    async fn seeded() -> (InMemoryRecordStore, RecordReader) {
        let store = InMemoryRecordStore::new();
        store.write("P2", r#"{"recordId":"P2","name":"B"}"#).await.unwrap();
        store.write("P1", r#"{"recordId":"P1","name":"A"}"#).await.unwrap();
        let reader = RecordReader::new(Arc::new(store.clone()));
        (store, reader)
    }

    #[tokio::test]
    async fn list_ids_sorted() {
        let (_store, reader) = seeded().await;
        let ids: Vec<String> = reader
            .list_ids()
            .await
            .unwrap()
            .into_iter()
            .map(RecordId::into_inner)
            .collect();
        assert_eq!(ids, vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn fetch_returns_parsed_json() {
        let (_store, reader) = seeded().await;
        assert_eq!(
            reader.fetch("P1").await.unwrap(),
            Some(json!({ "recordId": "P1", "name": "A" }))
        );
        assert!(reader.fetch("P9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_all_in_order() {
        let (_store, reader) = seeded().await;
        let all = reader.fetch_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0.as_str(), "P1");
        assert_eq!(all[1].1["name"], json!("B"));
    }

    #[tokio::test]
    async fn corrupt_values_are_reported() {
        let (store, reader) = seeded().await;
        store.write("P3", "{not json").await.unwrap();
        assert!(matches!(
            reader.fetch("P3").await,
            Err(RegistryError::CorruptRecord { .. })
        ));
        assert!(reader.fetch_all().await.is_err());
    }

    #[tokio::test]
    async fn invalid_lookup_key_is_a_store_error() {
        let (_store, reader) = seeded().await;
        assert!(matches!(
            reader.fetch("not a key").await,
            Err(RegistryError::Store(_))
        ));
    }
}
