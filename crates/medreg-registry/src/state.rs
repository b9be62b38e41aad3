use serde::Serialize;

/// Admission bookkeeping owned by one registry.
///
/// `admitted_count` caches the number of distinct keys ever written to the
/// store; the store itself has no cheap count. It only grows, and only while
/// the registry holds the admission lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    admitted_count: u64,
    capacity: u64,
}

impl RegistryState {
    pub fn new(capacity: u64) -> Self {
        Self {
            admitted_count: 0,
            capacity,
        }
    }

    /// State for a registry reopened over `admitted_count` stored identities.
    pub fn resume(capacity: u64, admitted_count: u64) -> Self {
        Self {
            admitted_count,
            capacity,
        }
    }

    pub fn admitted_count(&self) -> u64 {
        self.admitted_count
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// How many new identities can still be admitted.
    pub fn remaining(&self) -> u64 {
        self.capacity.saturating_sub(self.admitted_count)
    }

    /// Returns `true` when no new identity may be admitted.
    pub fn is_full(&self) -> bool {
        self.admitted_count >= self.capacity
    }

    /// Count one first-time admission and return the new total.
    ///
    /// Callers check [`Self::is_full`] first, under the same lock.
    pub(crate) fn record_admission(&mut self) -> u64 {
        debug_assert!(!self.is_full(), "admission recorded past capacity");
        self.admitted_count += 1;
        self.admitted_count
    }
}
