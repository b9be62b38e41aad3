//! In-memory storage tree for tests and ephemeral deployments.
//!
//! [`InMemoryStorageTree`] holds every node of a hierarchical key-value tree
//! in one `BTreeMap` keyed by dotted path, behind a `RwLock`.
//! [`InMemoryRecordStore`] is a handle on one namespace of that tree and
//! implements [`RecordStore`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::names::{validate_key, validate_namespace};
use crate::traits::RecordStore;

/// Default namespace used by [`InMemoryRecordStore::new`].
const DEFAULT_NAMESPACE: &str = "patients";

/// A hierarchical key-value tree held entirely in memory.
///
/// Data is lost when the last handle is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStorageTree {
    nodes: RwLock<BTreeMap<String, String>>,
}

impl InMemoryStorageTree {
    /// Create a new empty tree.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a namespace (dotted path) of this tree as a record store.
    pub fn namespace(self: &Arc<Self>, path: &str) -> StoreResult<InMemoryRecordStore> {
        validate_namespace(path)?;
        Ok(InMemoryRecordStore {
            tree: Arc::clone(self),
            path: path.to_string(),
        })
    }

    /// Number of nodes holding a value, across all namespaces.
    pub fn len(&self) -> usize {
        self.nodes.read().map(|n| n.len()).unwrap_or(0)
    }

    /// Returns `true` if no node holds a value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full dotted paths of every node holding a value, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.nodes
            .read()
            .map(|n| n.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn get(&self, path: &str) -> StoreResult<Option<String>> {
        let nodes = self.nodes.read().map_err(|e| {
            StoreError::Unavailable(format!("lock poisoned: {e}"))
        })?;
        Ok(nodes.get(path).cloned())
    }

    fn contains(&self, path: &str) -> StoreResult<bool> {
        let nodes = self.nodes.read().map_err(|e| {
            StoreError::Unavailable(format!("lock poisoned: {e}"))
        })?;
        Ok(nodes.contains_key(path))
    }

    fn set(&self, path: String, value: &str) -> StoreResult<()> {
        let mut nodes = self.nodes.write().map_err(|e| {
            StoreError::Unavailable(format!("lock poisoned: {e}"))
        })?;
        nodes.insert(path, value.to_string());
        Ok(())
    }

    /// Segments directly below `path` that hold a value, sorted.
    ///
    /// Deeper nodes (`path.a.b`) do not make `a` a child.
    fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        let nodes = self.nodes.read().map_err(|e| {
            StoreError::Unavailable(format!("lock poisoned: {e}"))
        })?;
        let prefix = format!("{path}.");
        Ok(nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| &k[prefix.len()..])
            .filter(|segment| !segment.contains('.'))
            .map(str::to_string)
            .collect())
    }
}

/// One namespace of an [`InMemoryStorageTree`].
///
/// Cloning the handle shares the underlying tree.
#[derive(Clone, Debug)]
pub struct InMemoryRecordStore {
    tree: Arc<InMemoryStorageTree>,
    path: String,
}

impl InMemoryRecordStore {
    /// Create a store over a fresh tree, in the `patients` namespace.
    pub fn new() -> Self {
        Self {
            tree: InMemoryStorageTree::new(),
            path: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Open a child namespace below this one.
    pub fn child(&self, segment: &str) -> StoreResult<Self> {
        validate_key(segment)?;
        Ok(Self {
            tree: Arc::clone(&self.tree),
            path: format!("{}.{segment}", self.path),
        })
    }

    /// Dotted path of this namespace.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The tree this namespace belongs to.
    pub fn tree(&self) -> &Arc<InMemoryStorageTree> {
        &self.tree
    }

    fn node_path(&self, key: &str) -> StoreResult<String> {
        validate_key(key)?;
        Ok(format!("{}.{key}", self.path))
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.node_path(key)?;
        self.tree.contains(&path)
    }

    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.node_path(key)?;
        self.tree.get(&path)
    }

    async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.node_path(key)?;
        debug!(path = %path, bytes = value.len(), "writing node");
        self.tree.set(path, value)
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        self.tree.children(&self.path)
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.path)
    }
}
