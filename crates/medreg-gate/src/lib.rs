//! Record shape gate for the medreg patient registry.
//!
//! Every candidate record passes through the gate before the registry checks
//! the store or the capacity ceiling. The gate runs an ordered pipeline of
//! stages (identity, required fields, photo) and produces an accept/reject
//! verdict with a per-stage trail.
//!
//! # Quick Start
//!
//! ```rust
//! use medreg_gate::{GateConfig, RecordGate};
//! use serde_json::json;
//!
//! let gate = RecordGate::with_default_stages(GateConfig::default()).unwrap();
//! let record = json!({
//!     "recordId": "P1", "name": "A", "age": 30, "gender": "M", "bloodType": "O+"
//! });
//! assert!(gate.evaluate(&record).unwrap().is_accepted());
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod stage;
pub mod stages;

// Re-exports for convenience.
pub use config::GateConfig;
pub use error::GateError;
pub use gate::{GateResult, RecordGate, Verdict};
pub use stage::{GateStage, StageDecision, StageResult};
pub use stages::{IdentityStage, PhotoStage, RequiredFieldsStage};
