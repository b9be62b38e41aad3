//! Admission control for the medreg patient registry.
//!
//! This crate is the heart of medreg. It provides:
//! - [`Registry`]: validates candidates through the record gate, classifies
//!   them as new or existing, enforces the capacity ceiling on distinct
//!   identities, and persists them to a [`medreg_store::RecordStore`]
//! - [`RegistryState`]: the admitted-count bookkeeping a registry owns
//! - [`InvitationIssuer`] / [`Invitation`] / [`Seat`]: single-use submission
//!   tokens and the transaction handle that is exited only on success
//! - [`RecordReader`]: the read side, listing and fetching stored records
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use medreg_registry::{Registry, RegistryConfig};
//! use medreg_store::InMemoryRecordStore;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Registry::new(
//!     RegistryConfig::with_capacity(1),
//!     Arc::new(InMemoryRecordStore::new()),
//! ).unwrap();
//! let record = json!({
//!     "recordId": "P1", "name": "A", "age": 30, "gender": "M", "bloodType": "O+"
//! });
//! let admission = registry.submit(&record).await.unwrap();
//! assert!(admission.is_new());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod invitation;
pub mod reader;
pub mod registry;
pub mod state;

pub use config::{
    ExistencePolicy, InvitationConfig, RegistryConfig, DEFAULT_CAPACITY, DEFAULT_NAMESPACE,
};
pub use error::{AdmissionError, InvitationError, RegistryError, RegistryResult};
pub use invitation::{Invitation, InvitationIssuer, Seat};
pub use reader::RecordReader;
pub use registry::{Admission, AdmissionKind, Offer, Registry, SUCCESS_MESSAGE};
pub use state::RegistryState;
