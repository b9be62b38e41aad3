//! Keyed record storage for the medreg patient registry.
//!
//! The registry persists each record as a serialized JSON string under its
//! record id, inside one namespace of a hierarchical key-value tree (the
//! layout mirrors a storage node: `patientData.patients.<recordId>`).
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- namespace of an [`InMemoryStorageTree`], for
//!   tests and ephemeral deployments
//! - [`FsRecordStore`] -- one JSON file per record under a directory
//!
//! # Design Rules
//!
//! 1. Writes are upserts: the last write for a key wins, nothing is merged.
//! 2. Entries are never deleted by the registry.
//! 3. The store never interprets values -- it is a pure key-value store.
//! 4. Keys are validated as storage path segments before any I/O.
//! 5. All I/O errors are propagated; deciding what to absorb is the caller's job.

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsRecordStore;
pub use memory::{InMemoryRecordStore, InMemoryStorageTree};
pub use names::{validate_key, validate_namespace, MAX_KEY_LEN};
pub use traits::RecordStore;
