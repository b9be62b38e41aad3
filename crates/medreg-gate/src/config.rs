use serde::{Deserialize, Serialize};

use medreg_types::fields;

use crate::error::GateError;

/// Configuration for the record shape gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Fields that must be present and non-null.
    pub required_fields: Vec<String>,
    /// Name of the optional image field.
    pub photo_field: String,
    /// Prefix a non-empty image value must start with.
    pub photo_prefix: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            required_fields: fields::REQUIRED.iter().map(|f| f.to_string()).collect(),
            photo_field: fields::PHOTO.to_string(),
            photo_prefix: fields::PHOTO_PREFIX.to_string(),
        }
    }
}

impl GateConfig {
    /// Check the configuration is usable.
    ///
    /// The identity field is always checked by the identity stage, so it may
    /// be omitted from `required_fields`; blank names are rejected.
    pub fn validate(&self) -> Result<(), GateError> {
        if let Some(i) = self.required_fields.iter().position(|f| f.trim().is_empty()) {
            return Err(GateError::Config(format!(
                "required field at index {i} is blank"
            )));
        }
        if self.photo_field.trim().is_empty() {
            return Err(GateError::Config("photo field name is blank".into()));
        }
        if self.photo_prefix.is_empty() {
            return Err(GateError::Config("photo prefix must not be empty".into()));
        }
        Ok(())
    }
}
