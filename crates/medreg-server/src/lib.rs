//! HTTP server for the medreg patient registry.
//!
//! Exposes invitation issuance, record submission, and the read side
//! (identity listing and single-record fetch) over a JSON API.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{ServerConfig, StorageConfig, DEFAULT_PORT};
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::{AppState, SubmitRequest, SubmitResponse};
pub use server::{open_store, RegistryServer};
