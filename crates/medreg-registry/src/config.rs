use serde::{Deserialize, Serialize};

use medreg_gate::GateConfig;
use medreg_store::validate_namespace;

use crate::error::RegistryError;

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: u64 = 100;

/// Namespace records are stored under when none is configured.
pub const DEFAULT_NAMESPACE: &str = "patients";

/// Most invitations kept outstanding at once; issuing more evicts the oldest.
pub const DEFAULT_MAX_OUTSTANDING: usize = 10_000;

/// Most redeemed invitation ids remembered for replay detection.
pub const DEFAULT_MAX_REMEMBERED: usize = 10_000;

/// Seconds an unredeemed invitation stays valid.
pub const DEFAULT_INVITATION_TTL_SECS: u64 = 3_600;

/// What to do when the store cannot answer "does this record exist?".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExistencePolicy {
    /// Treat the record as new and carry on.
    #[default]
    FailOpen,
    /// Reject the submission with `ExistenceCheckFailed`.
    FailClosed,
}

/// Configuration fixed when a registry is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of distinct record identities ever admitted.
    pub capacity: u64,
    /// Store namespace (dotted path) holding one entry per record.
    pub namespace: String,
    /// Policy for failed existence lookups.
    pub existence_policy: ExistencePolicy,
    /// Shape rules.
    pub gate: GateConfig,
    /// Invitation bookkeeping bounds.
    pub invitations: InvitationConfig,
}

/// Bounds on the state an invitation issuer keeps.
///
/// An invitation that expired or was evicted is reported as unknown. A
/// replay of a redeemed id that is no longer remembered is reported as
/// unknown too; either way it is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationConfig {
    pub max_outstanding: usize,
    pub max_remembered: usize,
    pub ttl_secs: u64,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            max_outstanding: DEFAULT_MAX_OUTSTANDING,
            max_remembered: DEFAULT_MAX_REMEMBERED,
            ttl_secs: DEFAULT_INVITATION_TTL_SECS,
        }
    }
}

impl InvitationConfig {
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.max_outstanding == 0 {
            return Err(RegistryError::Config(
                "invitations.max_outstanding must be at least 1".into(),
            ));
        }
        if self.ttl_secs == 0 {
            return Err(RegistryError::Config(
                "invitations.ttl_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            namespace: DEFAULT_NAMESPACE.to_string(),
            existence_policy: ExistencePolicy::default(),
            gate: GateConfig::default(),
            invitations: InvitationConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Default configuration with the given capacity.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        validate_namespace(&self.namespace)
            .map_err(|e| RegistryError::Config(format!("namespace: {e}")))?;
        self.gate.validate()?;
        self.invitations.validate()?;
        Ok(())
    }
}
