//! Storage key validation.
//!
//! Keys and namespace segments follow storage-node path rules:
//! - 1 to [`MAX_KEY_LEN`] characters
//! - only ASCII letters, digits, `_` and `-`
//!
//! Namespaces are dot-separated sequences of valid segments
//! (e.g. `patientData.patients`).

use crate::error::{StoreError, StoreResult};

/// Longest key or namespace segment accepted by any backend.
pub const MAX_KEY_LEN: usize = 100;

/// Validate a single key (one path segment).
///
/// # Examples
///
/// ```
/// use medreg_store::names::validate_key;
///
/// assert!(validate_key("PAT-2024-001").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a.b").is_err());
/// ```
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::invalid_key(key, "key must not be empty"));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(StoreError::invalid_key(
            key,
            format!("key longer than {MAX_KEY_LEN} characters"),
        ));
    }
    if let Some(ch) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(StoreError::invalid_key(
            key,
            format!("contains forbidden character: {ch:?}"),
        ));
    }
    Ok(())
}

/// Validate a dotted namespace path, returning its segments.
pub fn validate_namespace(path: &str) -> StoreResult<Vec<&str>> {
    if path.is_empty() {
        return Err(StoreError::invalid_key(path, "namespace must not be empty"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    for segment in &segments {
        validate_key(segment).map_err(|e| match e {
            StoreError::InvalidKey { reason, .. } => StoreError::invalid_key(
                path,
                format!("segment {segment:?}: {reason}"),
            ),
            other => other,
        })?;
    }
    Ok(segments)
}
