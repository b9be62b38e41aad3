//! Filesystem-backed record store.
//!
//! On-disk layout, one directory per namespace segment:
//! ```text
//! <root>/patientData/patients/P1.json
//! <root>/patientData/patients/P2.json
//! ```
//! Writes go to a hidden temporary file in the same directory and are then
//! renamed over the target, so a reader never observes a torn value.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::names::{validate_key, validate_namespace};
use crate::traits::RecordStore;

const EXTENSION: &str = "json";

/// Distinguishes temporary files of concurrent writers within a process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Record store keeping one `<key>.json` file per entry.
#[derive(Clone, Debug)]
pub struct FsRecordStore {
    dir: PathBuf,
    namespace: String,
    read_only: bool,
}

impl FsRecordStore {
    /// Open (or create) the namespace directory below `root`.
    pub async fn open(root: impl AsRef<Path>, namespace: &str) -> StoreResult<Self> {
        let dir = namespace_dir(root.as_ref(), namespace)?;
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "opened record store");
        Ok(Self {
            dir,
            namespace: namespace.to_string(),
            read_only: false,
        })
    }

    /// Open an existing namespace for reading only.
    ///
    /// A missing directory is treated as an empty namespace.
    pub fn open_read_only(root: impl AsRef<Path>, namespace: &str) -> StoreResult<Self> {
        Ok(Self {
            dir: namespace_dir(root.as_ref(), namespace)?,
            namespace: namespace.to_string(),
            read_only: true,
        })
    }

    /// Directory holding this namespace's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

fn namespace_dir(root: &Path, namespace: &str) -> StoreResult<PathBuf> {
    let segments = validate_namespace(namespace)?;
    Ok(segments
        .into_iter()
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment)))
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.entry_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let path = self.entry_path(key)?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{key}.{}.{seq}.tmp", std::process::id()));

        fs::write(&tmp, value.as_bytes()).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                warn!(tmp = %tmp.display(), "failed to remove temporary file: {cleanup}");
            }
            return Err(e.into());
        }
        debug!(path = %path.display(), bytes = value.len(), "wrote record file");
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Temporary files start with '.', which validate_key rejects.
            if validate_key(stem).is_ok() {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }
}
