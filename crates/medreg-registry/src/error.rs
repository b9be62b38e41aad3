use thiserror::Error;
use uuid::Uuid;

use medreg_gate::GateError;
use medreg_store::StoreError;

/// Why a submission was not accepted.
///
/// No variant is fatal: the registry keeps serving after any of them, and
/// none of them changes the admitted count.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// A required field is missing or null, or the photo is malformed.
    #[error("invalid record shape: {reason}")]
    InvalidRecordShape { reason: String },

    /// A new identity was submitted while the registry is full.
    #[error("capacity exceeded: the registry admits at most {capacity} records")]
    CapacityExceeded { capacity: u64 },

    /// The store refused the write. The counter was not incremented.
    #[error("failed to store record {record_id}: {source}")]
    StoreWriteFailed {
        record_id: String,
        #[source]
        source: StoreError,
    },

    /// The existence lookup failed under the fail-closed policy.
    #[error("existence check failed for record {record_id}: {source}")]
    ExistenceCheckFailed {
        record_id: String,
        #[source]
        source: StoreError,
    },

    /// A gate stage malfunctioned (as opposed to rejecting the record).
    #[error("gate error: {0}")]
    Gate(#[from] GateError),
}

impl AdmissionError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRecordShape { .. } => "InvalidRecordShape",
            Self::CapacityExceeded { .. } => "CapacityExceeded",
            Self::StoreWriteFailed { .. } => "StoreWriteFailed",
            Self::ExistenceCheckFailed { .. } => "ExistenceCheckFailed",
            Self::Gate(_) => "GateError",
        }
    }
}

/// Errors from redeeming an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvitationError {
    #[error("invitation {0} was not issued by this registry")]
    Unknown(Uuid),

    #[error("invitation {0} has already been used")]
    AlreadyRedeemed(Uuid),
}

/// Errors from constructing a registry or reading records back.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("gate error: {0}")]
    Gate(#[from] GateError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("stored record {record_id} is corrupt: {reason}")]
    CorruptRecord { record_id: String, reason: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
