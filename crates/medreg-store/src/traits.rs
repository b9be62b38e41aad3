use async_trait::async_trait;

use crate::error::StoreResult;

/// Keyed record store: one namespace of serialized records.
///
/// All implementations must satisfy these invariants:
/// - `write` is an upsert. The last value written for a key is the one `read`
///   returns; old and new payloads are never merged.
/// - `exists` returns `Ok(false)` for a well-formed key that was never
///   written. Errors are reserved for backend failures and invalid keys.
/// - Entries are never deleted through this interface.
/// - Values are opaque strings; the store never interprets them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check whether a value was ever written under `key`.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Read the latest value written under `key`.
    ///
    /// Returns `Ok(None)` if nothing was written.
    async fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// List the keys of this namespace that hold a value, sorted and unique.
    async fn keys(&self) -> StoreResult<Vec<String>>;

    /// Dotted namespace this store is scoped to, if it has one.
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Read several keys.
    ///
    /// Default implementation calls `read()` for each key. Backends may
    /// override for fewer round-trips.
    async fn read_batch(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.read(key).await?);
        }
        Ok(values)
    }
}
