//! Foundation types for the medreg patient registry.
//!
//! Every other medreg crate depends on `medreg-types`. The registry treats a
//! record as an opaque JSON object keyed by its `recordId`; this crate holds
//! the identity newtype, the record wrapper, and the well-known field names.
//!
//! # Key Types
//!
//! - [`RecordId`] - the string identity a record is stored under
//! - [`Record`] - a JSON object with a string `recordId`
//! - [`fields`] - names of the schema-constrained fields

pub mod error;
pub mod fields;
pub mod record;

pub use error::TypeError;
pub use record::{Record, RecordId};
