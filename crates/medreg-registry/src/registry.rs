use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use medreg_gate::{RecordGate, Verdict};
use medreg_store::{RecordStore, StoreError};
use medreg_types::{Record, RecordId};

use crate::config::{ExistencePolicy, RegistryConfig};
use crate::error::{AdmissionError, InvitationError, RegistryError, RegistryResult};
use crate::invitation::{Invitation, InvitationIssuer, Seat, PUBLISH_DESCRIPTION};
use crate::reader::RecordReader;
use crate::state::RegistryState;

/// Message returned with every accepted submission.
pub const SUCCESS_MESSAGE: &str = "Patient data published successfully";

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Whether a submission introduced a new identity or replaced an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionKind {
    /// First-time admission; counted against capacity.
    Admitted,
    /// Overwrite of an already stored identity; not counted.
    Updated,
}

/// An accepted submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
    pub record_id: RecordId,
    pub kind: AdmissionKind,
    /// Admitted count right after this submission.
    pub admitted_count: u64,
}

impl Admission {
    pub fn message(&self) -> &'static str {
        SUCCESS_MESSAGE
    }

    pub fn is_new(&self) -> bool {
        self.kind == AdmissionKind::Admitted
    }
}

/// Outcome of redeeming an invitation and submitting through it.
#[derive(Debug)]
pub struct Offer {
    /// Exited if and only if `result` is `Ok`.
    pub seat: Seat,
    pub result: Result<Admission, AdmissionError>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Capacity-bounded, deduplicating record registry.
///
/// Each record is validated by the gate, classified as new or existing by
/// asking the store, checked against the capacity ceiling, written, and (if
/// new) counted. The existence check, capacity check, write and count run as
/// one critical section: the state lock is held across the store awaits, so
/// concurrent submissions can never admit more than `capacity` identities.
pub struct Registry {
    config: RegistryConfig,
    gate: RecordGate,
    store: Arc<dyn RecordStore>,
    state: Mutex<RegistryState>,
    invitations: InvitationIssuer,
}

impl Registry {
    /// Create a registry over a store already scoped to its namespace.
    ///
    /// A store that reports its namespace must report the configured one.
    pub fn new(config: RegistryConfig, store: Arc<dyn RecordStore>) -> RegistryResult<Self> {
        config.validate()?;
        if let Some(namespace) = store.namespace() {
            if namespace != config.namespace {
                return Err(RegistryError::Config(format!(
                    "store namespace {namespace:?} does not match configured namespace {:?}",
                    config.namespace
                )));
            }
        }
        let gate = RecordGate::with_default_stages(config.gate.clone())?;
        Ok(Self::with_gate(config, gate, store))
    }

    /// Create a registry over a store that may already hold records.
    ///
    /// Every stored key counts as an admitted identity, so a registry
    /// reopened over a persistent store keeps its capacity accounting.
    pub async fn open(config: RegistryConfig, store: Arc<dyn RecordStore>) -> RegistryResult<Self> {
        let registry = Self::new(config, store)?;
        let existing = registry.store.keys().await?.len() as u64;
        if existing > 0 {
            info!(
                existing,
                capacity = registry.config.capacity,
                "resuming registry over stored records"
            );
            *registry.state.lock().await = RegistryState::resume(registry.config.capacity, existing);
        }
        Ok(registry)
    }

    /// Create a registry with a custom gate pipeline.
    pub fn with_gate(config: RegistryConfig, gate: RecordGate, store: Arc<dyn RecordStore>) -> Self {
        let state = Mutex::new(RegistryState::new(config.capacity));
        Self {
            gate,
            store,
            state,
            invitations: InvitationIssuer::with_config(config.invitations.clone()),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }

    /// Current admitted count. Waits for any in-flight submission.
    pub async fn admitted_count(&self) -> u64 {
        self.state.lock().await.admitted_count()
    }

    /// Copy of the current bookkeeping.
    pub async fn state(&self) -> RegistryState {
        *self.state.lock().await
    }

    /// Read-only view over the stored records.
    pub fn reader(&self) -> RecordReader {
        RecordReader::new(Arc::clone(&self.store))
    }

    pub fn invitations(&self) -> &InvitationIssuer {
        &self.invitations
    }

    /// Issue a single-use invitation to submit one record.
    pub fn make_invitation(&self) -> Invitation {
        self.invitations.issue(PUBLISH_DESCRIPTION)
    }

    /// Redeem `invitation` and submit `candidate` through it.
    ///
    /// The returned seat is exited only when the submission is accepted.
    /// An invitation that was never issued here, or was already used, is
    /// rejected before the candidate is looked at.
    pub async fn offer(
        &self,
        invitation: Invitation,
        candidate: &Value,
    ) -> Result<Offer, InvitationError> {
        let mut seat = self.invitations.redeem(invitation)?;
        let result = self.submit(candidate).await;
        if result.is_ok() {
            seat.exit();
        }
        Ok(Offer { seat, result })
    }

    /// Validate and store one candidate record.
    pub async fn submit(&self, candidate: &Value) -> Result<Admission, AdmissionError> {
        let record = self.validate(candidate)?;
        let record_id = record.id().clone();
        let key = record_id.as_str();
        let value = record
            .to_json()
            .map_err(|e| AdmissionError::StoreWriteFailed {
                record_id: key.to_string(),
                source: StoreError::Serialization(e.to_string()),
            })?;

        let mut state = self.state.lock().await;

        let exists = match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(source) => match self.config.existence_policy {
                ExistencePolicy::FailOpen => {
                    warn!(record_id = %key, error = %source, "existence check failed; treating record as new");
                    false
                }
                ExistencePolicy::FailClosed => {
                    warn!(record_id = %key, error = %source, "existence check failed; rejecting submission");
                    return Err(AdmissionError::ExistenceCheckFailed {
                        record_id: key.to_string(),
                        source,
                    });
                }
            },
        };
        let is_new = !exists;

        if is_new && state.is_full() {
            warn!(record_id = %key, capacity = state.capacity(), "registry is full");
            return Err(AdmissionError::CapacityExceeded {
                capacity: state.capacity(),
            });
        }

        if let Err(source) = self.store.write(key, &value).await {
            warn!(record_id = %key, error = %source, "store write failed");
            return Err(AdmissionError::StoreWriteFailed {
                record_id: key.to_string(),
                source,
            });
        }

        let kind = if is_new {
            state.record_admission();
            AdmissionKind::Admitted
        } else {
            AdmissionKind::Updated
        };
        let admitted_count = state.admitted_count();
        drop(state);

        info!(record_id = %key, ?kind, admitted_count, "record published");
        Ok(Admission {
            record_id,
            kind,
            admitted_count,
        })
    }

    fn validate(&self, candidate: &Value) -> Result<Record, AdmissionError> {
        let result = self.gate.evaluate(candidate)?;
        if let Verdict::Rejected { stage, reason } = result.verdict {
            warn!(%stage, %reason, "invalid record shape");
            return Err(AdmissionError::InvalidRecordShape { reason });
        }
        Record::from_value(candidate.clone()).map_err(|e| AdmissionError::InvalidRecordShape {
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("invitations", &self.invitations)
            .finish_non_exhaustive()
    }
}
